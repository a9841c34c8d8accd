mod pipelines;
mod utils;
mod config;
mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use std::{env, fs};
use std::io::Write;

use anyhow::Result;
use env_logger::Builder;
use log::{LevelFilter, error, info};

use crate::cli::parse;
use crate::config::defs::{PipelineError, RunConfig};
use pipelines::align_batch;
use pipelines::resolve_batch;

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n BatchAlign\n-------------\n");

    let dir = env::current_dir()?;
    info!("The current directory is {:?}\n", dir);

    let scratch_dir = setup_scratch_dir(&args)?;
    info!("The scratch directory is {:?}\n", scratch_dir);

    let out_dir = setup_output_dir(&args, &dir)?;
    let module = args.module.clone();
    let run_config = Arc::new(RunConfig {
        cwd: dir,
        scratch_dir,
        out_dir,
        args,
        log_level,
    });

    if let Err(e) = match module.as_str() {
        "align_batch" => align_batch::run(run_config).await,
        "resolve_batch" => resolve_batch::run(run_config).await,
        _ => Err(PipelineError::InvalidConfig(format!(
            "Invalid module: {}",
            module
        ))),
    } {
        error!(
            "Pipeline failed: {} at {} milliseconds.",
            e,
            run_start.elapsed().as_millis()
        );
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

/// Sets up output directory
/// If `out_dir` is specified from args, uses it;
/// otherwise, creates a directory named `<manifest_base>_YYYYMMDD`.
/// Ensures the directory exists.
///
/// # Arguments
/// * `args` - The parsed command-line arguments.
/// * `cwd` - The current working directory.
/// # Returns
/// path to the output directory.
fn setup_output_dir(args: &cli::args::Arguments, cwd: &PathBuf) -> Result<PathBuf> {
    let out_dir = match &args.out_dir {
        Some(out) => {
            let path = PathBuf::from(out);
            if path.is_absolute() {
                path
            } else {
                cwd.join(path)
            }
        }
        None => {
            let manifest = match &args.batch_manifest {
                Some(manifest) => PathBuf::from(manifest),
                None => return Err(anyhow::anyhow!("Batch manifest path required (-b)")),
            };
            let dir_base = manifest
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| "batch".to_string());
            let timestamp = chrono::Local::now().format("%Y%m%d").to_string();
            cwd.join(format!("{}_{}", dir_base, timestamp))
        }
    };
    fs::create_dir_all(&out_dir)?;
    Ok(out_dir)
}

/// Picks the scratch directory for temporary files.
/// Uses the argument when given; otherwise prefers /dev/shm (RAM disk),
/// falling back to the standard temp dir.
fn setup_scratch_dir(args: &cli::args::Arguments) -> Result<PathBuf> {
    let scratch_dir = match &args.scratch_dir {
        Some(scratch) => PathBuf::from(scratch),
        None => {
            if let Ok(metadata) = fs::metadata("/dev/shm") {
                if metadata.is_dir() {
                    return Ok(PathBuf::from("/dev/shm"));
                }
            }
            env::temp_dir()
        }
    };
    fs::create_dir_all(&scratch_dir)?;
    Ok(scratch_dir)
}
