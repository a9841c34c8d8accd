use clap::{Parser, ValueEnum};

use crate::config::defs::DEFAULT_CATALOG_NAME;

#[derive(Debug, Clone, ValueEnum, Default, PartialEq)]
pub enum Preset {
    #[default]
    Hifi,
    Subread,
    Isoseq,
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "batchalign", version = "0.1")]
pub struct Arguments {

    #[arg(short, long)]
    pub module: String,

    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    #[arg(short = 'b', long = "batch", help = "Path to the tab-separated batch manifest (alignment_file, sample_id, failed_target).")]
    pub batch_manifest: Option<String>,

    #[arg(short = 'r', long = "reference")]
    pub reference: Option<String>,

    #[arg(short = 'o', long = "out", help = "Output directory for all generated files. If not specified, a directory named '<manifest_base>_YYYYMMDD' will be created in the current working directory.")]
    pub out_dir: Option<String>,

    #[arg(long, help = "Scratch directory for temporary files. Defaults to /dev/shm when present, otherwise the system temp dir.")]
    pub scratch_dir: Option<String>,

    #[arg(long = "catalog", default_value = DEFAULT_CATALOG_NAME, help = "Sample catalog file, resolved relative to the output directory unless absolute.")]
    pub catalog: String,

    #[arg(long = "preset", default_value = "hifi", value_enum)]
    pub preset: Preset,

    #[arg(long, default_value_t = 4)]
    pub threads: usize,

    #[arg(long, default_value_t = false)]
    pub limit_align_threads: bool,

    #[arg(long, default_value_t = false, help = "Log the external commands that would run without spawning them.")]
    pub dry_run: bool,

    #[arg(long, default_value_t = false)]
    pub skip_version_check: bool,
}
