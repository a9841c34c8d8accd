// File copy as an injected capability. The merge stage needs a pass-through
// copy for single-file samples; which tool performs it is a strategy choice,
// not a runtime probe, so behavior stays deterministic and testable without
// the external binaries installed.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Result, anyhow};
use log::warn;

use crate::config::defs::RSYNC_TAG;

pub trait FileCopier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Copies `src` to `dst`, returning the number of bytes copied.
    fn copy(&self, src: &Path, dst: &Path) -> Result<u64>;
}

/// Default copier backed by std::fs::copy.
pub struct NativeCopier;

impl FileCopier for NativeCopier {
    fn name(&self) -> &'static str {
        "native"
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        fs::copy(src, dst)
            .map_err(|e| anyhow!("copy {} -> {}: {}", src.display(), dst.display(), e))
    }
}

/// Copier shelling out to rsync, for filesystems where a plain copy is
/// unreliable (e.g. network scratch).
pub struct RsyncCopier;

impl FileCopier for RsyncCopier {
    fn name(&self) -> &'static str {
        RSYNC_TAG
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        let output = Command::new(RSYNC_TAG)
            .arg("-a")
            .arg(src)
            .arg(dst)
            .output()
            .map_err(|e| anyhow!("Failed to spawn {}: {}. Is rsync installed?", RSYNC_TAG, e))?;
        if !output.status.success() {
            return Err(anyhow!(
                "{} failed ({}): {}",
                RSYNC_TAG,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(fs::metadata(dst)?.len())
    }
}

/// Composes a primary copier with a fallback tried when the primary fails.
pub struct FallbackCopier {
    primary: Box<dyn FileCopier>,
    fallback: Box<dyn FileCopier>,
}

impl FallbackCopier {
    pub fn new(primary: Box<dyn FileCopier>, fallback: Box<dyn FileCopier>) -> Self {
        FallbackCopier { primary, fallback }
    }
}

impl FileCopier for FallbackCopier {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn copy(&self, src: &Path, dst: &Path) -> Result<u64> {
        match self.primary.copy(src, dst) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                warn!(
                    "{} copier failed ({}); retrying with {}",
                    self.primary.name(),
                    e,
                    self.fallback.name()
                );
                self.fallback.copy(src, dst)
            }
        }
    }
}

/// Native copy first, rsync if that fails.
pub fn default_copier() -> FallbackCopier {
    FallbackCopier::new(Box::new(NativeCopier), Box::new(RsyncCopier))
}
