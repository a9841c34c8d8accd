pub mod align_batch;
pub mod resolve_batch;

use std::path::PathBuf;

use crate::config::defs::{PipelineError, RunConfig};
use crate::utils::file::resolve_input_path;

/// Resolves the manifest path from the arguments against the cwd.
pub(crate) fn manifest_path(config: &RunConfig) -> Result<PathBuf, PipelineError> {
    let manifest = config.args.batch_manifest.as_ref().ok_or_else(|| {
        PipelineError::InvalidConfig("Batch manifest path required (-b)".to_string())
    })?;
    Ok(resolve_input_path(PathBuf::from(manifest).as_path(), &config.cwd))
}
