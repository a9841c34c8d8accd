use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::defs::{PBMM2_TAG, PipelineError, RunConfig, SAMTOOLS_TAG};
use crate::pipelines::manifest_path;
use crate::utils::catalog::SampleCatalog;
use crate::utils::command::{check_versions, pbmm2, run_tool, samtools};
use crate::utils::copy::{FileCopier, default_copier};
use crate::utils::file::{
    aligned_output_name, format_file_size, format_size, merged_output_name, resolve_input_path,
};
use crate::utils::manifest::{SampleGroup, read_manifest, resolve_batch};

/// Runs the full batch flow: resolve the manifest, align every non-failed
/// file of every sample, merge per-file outputs into one artifact per sample
/// and record it in the sample catalog.
pub async fn run(config: Arc<RunConfig>) -> Result<(), PipelineError> {
    println!("\n-------------\n Align Batch\n-------------\n");

    let manifest = manifest_path(&config)?;
    let reference = config.args.reference.as_ref().ok_or_else(|| {
        PipelineError::InvalidConfig("Reference path required (-r) for align_batch".to_string())
    })?;
    let reference = resolve_input_path(Path::new(reference), &config.cwd);

    if !config.args.dry_run && !config.args.skip_version_check {
        check_versions(&[PBMM2_TAG, SAMTOOLS_TAG])
            .await
            .map_err(|e| PipelineError::ToolPreflight(e.to_string()))?;
    }

    info!(
        "Reading batch manifest {} ({})",
        manifest.display(),
        format_file_size(&manifest)
    );
    let rows = read_manifest(&manifest)?;
    let batch = resolve_batch(&rows);
    info!(
        "Resolved {} sample(s), {} file(s); {} failed-target row(s) skipped",
        batch.groups().len(),
        batch.total_files(),
        batch.skipped()
    );

    let catalog_path = catalog_path(&config);
    let mut catalog = SampleCatalog::load(&catalog_path)?;
    let copier = default_copier();

    for group in batch.groups() {
        if group.files.is_empty() {
            warn!(
                "Sample {} has no usable inputs (all rows failed target); skipping",
                group.sample_id
            );
            continue;
        }
        let aligned = align_group(&config, group, &reference).await?;
        let merged = merge_group(&config, group, &aligned, &copier).await?;
        catalog.record(&group.sample_id, merged.clone(), aligned);
        if !config.args.dry_run {
            // Persisted per sample: a failure later in the batch must not
            // leave artifacts on disk that the catalog never recorded.
            catalog.save(&catalog_path)?;
        }
        info!(
            "Merged artifact for {}: {} ({})",
            group.sample_id,
            merged.display(),
            format_file_size(&merged)
        );
    }

    if config.args.dry_run {
        info!("[dry-run] catalog not written");
    } else if !catalog.is_empty() {
        info!(
            "Sample catalog {} holds {} sample(s)",
            catalog_path.display(),
            catalog.len()
        );
    }

    Ok(())
}

/// Aligns each file of a group, one aligner invocation per input. Output
/// names carry a zero-padded sequence index so multi-file samples never
/// collide.
async fn align_group(
    config: &RunConfig,
    group: &SampleGroup,
    reference: &Path,
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut aligned = Vec::with_capacity(group.files.len());
    for (idx, file) in group.files.iter().enumerate() {
        let input = resolve_input_path(file, &config.cwd);
        let output = aligned_output_name(&config.out_dir, &group.sample_id, idx);
        info!(
            "Aligning {} ({}) -> {}",
            input.display(),
            format_file_size(&input),
            output.display()
        );

        let args_vec = pbmm2::arg_generator(&config.args, reference, &input, &output);
        if config.args.dry_run {
            info!("[dry-run] {} {}", PBMM2_TAG, args_vec.join(" "));
        } else {
            run_tool(PBMM2_TAG, &args_vec).await?;
            debug!(
                "Produced {} ({})",
                output.display(),
                format_file_size(&output)
            );
        }
        aligned.push(output);
    }
    Ok(aligned)
}

/// Produces exactly one merged artifact per sample: samtools merge for
/// multi-file groups, a pass-through copy for the single-file case.
async fn merge_group(
    config: &RunConfig,
    group: &SampleGroup,
    aligned: &[PathBuf],
    copier: &dyn FileCopier,
) -> Result<PathBuf, PipelineError> {
    let merged = merged_output_name(&config.out_dir, &group.sample_id);

    if aligned.len() == 1 {
        if config.args.dry_run {
            info!(
                "[dry-run] pass-through copy {} -> {}",
                aligned[0].display(),
                merged.display()
            );
        } else {
            let bytes = copier
                .copy(&aligned[0], &merged)
                .map_err(|e| PipelineError::IOError(e.to_string()))?;
            debug!(
                "Pass-through copy for {}: {}",
                group.sample_id,
                format_size(bytes, None)
            );
        }
    } else {
        let args_vec = samtools::merge_arg_generator(config.args.threads, &merged, aligned);
        if config.args.dry_run {
            info!("[dry-run] {} {}", SAMTOOLS_TAG, args_vec.join(" "));
        } else {
            run_tool(SAMTOOLS_TAG, &args_vec).await?;
        }
    }

    Ok(merged)
}

fn catalog_path(config: &RunConfig) -> PathBuf {
    let path = Path::new(&config.args.catalog);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config.out_dir.join(path)
    }
}
