use std::collections::HashMap;
use std::path::PathBuf;

use lazy_static::lazy_static;
use log::LevelFilter;
use thiserror::Error;

use crate::cli::Arguments;

// External software
pub const PBMM2_TAG: &str = "pbmm2";
pub const SAMTOOLS_TAG: &str = "samtools";
pub const RSYNC_TAG: &str = "rsync";

lazy_static! {
    // Minimum (major, minor) per tool. Components are integers so that
    // 1.9 orders below 1.20.
    pub static ref TOOL_VERSIONS: HashMap<&'static str, (u32, u32)> = {
        let mut m = HashMap::new();
        m.insert(PBMM2_TAG, (1, 13));
        m.insert(SAMTOOLS_TAG, (1, 20));
        m.insert(RSYNC_TAG, (3, 1));

        m
    };
}

// Batch manifest schema
pub const MANIFEST_FILE_COLUMN: &str = "alignment_file";
pub const MANIFEST_SAMPLE_COLUMN: &str = "sample_id";
pub const MANIFEST_FAILED_COLUMN: &str = "failed_target";

// Static Filenames
pub const BATCH_SUMMARY_NAME: &str = "batch_summary.json";
pub const DEFAULT_CATALOG_NAME: &str = "sample_catalog.json";

// Static Parameters
pub const ALIGNED_SUFFIX: &str = "aligned";
pub const MERGED_SUFFIX: &str = "merged";
pub const BAM_EXT: &str = "bam";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed manifest at line {line}: {reason}")]
    InvalidManifest { line: usize, reason: String },

    #[error("{tool} failed ({status}): {stderr}")]
    ToolExecution {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Tool preflight failed: {0}")]
    ToolPreflight(String),

    #[error("Failed to spawn {tool}: {source}. Is {tool} installed?")]
    MissingTool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    IOError(String),
}

pub struct RunConfig {
    pub cwd: PathBuf,
    pub scratch_dir: PathBuf,
    pub out_dir: PathBuf,
    pub args: Arguments,
    pub log_level: LevelFilter,
}
