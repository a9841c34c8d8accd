/// Functions and structs for working with creating command-line arguments

use anyhow::{Result, anyhow};
use log::{debug, info};
use tokio::process::Command;

use crate::config::defs::{PBMM2_TAG, PipelineError, RSYNC_TAG, SAMTOOLS_TAG, TOOL_VERSIONS};

pub mod pbmm2 {
    use std::path::Path;
    use anyhow::anyhow;
    use tokio::process::Command;
    use crate::cli::{Arguments, Preset};
    use crate::config::defs::PBMM2_TAG;

    pub async fn pbmm2_presence_check() -> anyhow::Result<String> {
        let output = Command::new(PBMM2_TAG)
            .arg("--version")
            .output()
            .await
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is pbmm2 installed?", PBMM2_TAG, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout
            .lines()
            .next()
            .ok_or_else(|| anyhow!("No output from pbmm2 --version"))?;
        let version = first_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| anyhow!("Invalid pbmm2 --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in pbmm2 --version output: {}", first_line));
        }
        Ok(version)
    }

    pub fn arg_generator(
        args: &Arguments,
        reference: &Path,
        input: &Path,
        output: &Path,
    ) -> Vec<String> {
        let num_cores: usize = match &args.limit_align_threads {
            true => args.threads,
            false => num_cpus::get(),
        };

        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("align".to_string());
        args_vec.push("-j".to_string());
        args_vec.push(num_cores.to_string());

        args_vec.push("--preset".to_string());
        match args.preset {
            Preset::Hifi => args_vec.push("HIFI".to_string()),
            Preset::Subread => args_vec.push("SUBREAD".to_string()),
            Preset::Isoseq => args_vec.push("ISOSEQ".to_string()),
        }

        args_vec.push("--sort".to_string());
        args_vec.push(reference.to_string_lossy().to_string());
        args_vec.push(input.to_string_lossy().to_string());
        args_vec.push(output.to_string_lossy().to_string());

        args_vec
    }
}

pub mod samtools {
    use std::path::{Path, PathBuf};
    use anyhow::anyhow;
    use tokio::process::Command;
    use crate::config::defs::SAMTOOLS_TAG;

    pub async fn samtools_presence_check() -> anyhow::Result<String> {
        let output = Command::new(SAMTOOLS_TAG)
            .arg("--version")
            .output()
            .await
            .map_err(|e| anyhow!("Failed to spawn: {}. Is samtools installed?", e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout
            .lines()
            .next()
            .ok_or_else(|| anyhow!("No output from samtools --version"))?;
        let version = first_line
            .split_whitespace()
            .nth(1)
            .ok_or_else(|| anyhow!("Invalid samtools --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in samtools --version output: {}", first_line));
        }
        Ok(version)
    }

    /// Arguments for `samtools merge` over all per-file outputs of a sample.
    /// -f overwrites a stale artifact from a previous run.
    pub fn merge_arg_generator(threads: usize, output: &Path, inputs: &[PathBuf]) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("merge".to_string());
        args_vec.push("-f".to_string());
        args_vec.push("-@".to_string());
        args_vec.push(threads.to_string());
        args_vec.push(output.to_string_lossy().to_string());
        for input in inputs {
            args_vec.push(input.to_string_lossy().to_string());
        }
        args_vec
    }
}

pub mod rsync {
    use anyhow::anyhow;
    use tokio::process::Command;
    use crate::config::defs::RSYNC_TAG;

    pub async fn rsync_presence_check() -> anyhow::Result<String> {
        let output = Command::new(RSYNC_TAG)
            .arg("--version")
            .output()
            .await
            .map_err(|e| anyhow!("Failed to spawn: {}. Is rsync installed?", e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let first_line = stdout
            .lines()
            .next()
            .ok_or_else(|| anyhow!("No output from rsync --version"))?;
        // "rsync  version 3.2.7  protocol version 31"
        let version = first_line
            .split_whitespace()
            .nth(2)
            .ok_or_else(|| anyhow!("Invalid rsync --version output: {}", first_line))?
            .to_string();
        if version.is_empty() {
            return Err(anyhow!("Empty version number in rsync --version output: {}", first_line));
        }
        Ok(version)
    }
}

pub async fn check_version(tool: &str) -> Result<String> {
    let version = match tool {
        PBMM2_TAG => pbmm2::pbmm2_presence_check().await,
        SAMTOOLS_TAG => samtools::samtools_presence_check().await,
        RSYNC_TAG => rsync::rsync_presence_check().await,
        _ => return Err(anyhow!("Unknown tool: {}", tool)),
    };
    Ok(version?)
}

/// Confirms each tool is on PATH and at least the minimum version from
/// TOOL_VERSIONS. The leading major.minor components are compared as
/// integers.
pub async fn check_versions(tools: &[&str]) -> Result<()> {
    for tool in tools {
        let version = check_version(tool).await?;
        if let Some(&minimum) = TOOL_VERSIONS.get(tool) {
            if !version_at_least(&version, minimum) {
                return Err(anyhow!(
                    "{} version {} is older than required {}.{}",
                    tool,
                    version,
                    minimum.0,
                    minimum.1
                ));
            }
        }
        info!("{} version {}", tool, version);
    }
    Ok(())
}

/// True when `version`'s leading major.minor components reach `minimum`.
/// Components are compared numerically, never lexically or as floats, so
/// 1.9 orders below 1.20. An unparsable component counts as 0.
fn version_at_least(version: &str, minimum: (u32, u32)) -> bool {
    let mut parts = version.split('.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minor: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    (major, minor) >= minimum
}

/// Spawns an external tool and waits for it, mapping spawn failure and a
/// nonzero exit status onto the pipeline error variants.
pub async fn run_tool(tool: &str, args: &[String]) -> Result<(), PipelineError> {
    debug!("{} {}", tool, args.join(" "));
    let output = Command::new(tool)
        .args(args)
        .output()
        .await
        .map_err(|e| PipelineError::MissingTool {
            tool: tool.to_string(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(PipelineError::ToolExecution {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
