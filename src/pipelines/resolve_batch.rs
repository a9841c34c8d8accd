use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::defs::{BATCH_SUMMARY_NAME, PipelineError, RunConfig};
use crate::pipelines::manifest_path;
use crate::utils::file::{format_file_size, resolve_input_path};
use crate::utils::manifest::{read_manifest, resolve_batch};

#[derive(Debug, Serialize)]
struct GroupSummary {
    sample_id: String,
    files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BatchSummary {
    samples: Vec<GroupSummary>,
    skipped_rows: usize,
    total_files: usize,
}

/// Parses and resolves the batch manifest without running any alignment,
/// logging every group and writing a JSON summary into the output directory.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Resolve Batch\n-------------\n");

    let manifest = manifest_path(&config)?;
    info!(
        "Resolving batch manifest {} ({})",
        manifest.display(),
        format_file_size(&manifest)
    );

    let rows = read_manifest(&manifest)?;
    let batch = resolve_batch(&rows);

    for group in batch.groups() {
        info!(
            "Sample {}: {} file(s)",
            group.sample_id,
            group.files.len()
        );
        for file in &group.files {
            let path = resolve_input_path(file, &config.cwd);
            debug!("  {} ({})", path.display(), format_file_size(&path));
        }
    }
    if batch.skipped() > 0 {
        warn!("Skipped {} failed-target row(s)", batch.skipped());
    }
    info!(
        "Resolved {} sample(s), {} file(s) total",
        batch.groups().len(),
        batch.total_files()
    );

    let summary = BatchSummary {
        samples: batch
            .groups()
            .iter()
            .map(|g| GroupSummary {
                sample_id: g.sample_id.clone(),
                files: g.files.clone(),
            })
            .collect(),
        skipped_rows: batch.skipped(),
        total_files: batch.total_files(),
    };

    let summary_path = config.out_dir.join(BATCH_SUMMARY_NAME);
    let file = File::create(&summary_path).map_err(|e| {
        PipelineError::IOError(format!("cannot create {}: {}", summary_path.display(), e))
    })?;
    serde_json::to_writer_pretty(&file, &summary)
        .map_err(|e| PipelineError::IOError(e.to_string()))?;
    info!("Wrote batch summary to {}", summary_path.display());

    Ok(())
}
