// src/utils/file.rs: File size reporting and output path construction

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::defs::{ALIGNED_SUFFIX, BAM_EXT, MERGED_SUFFIX};

pub const BYTES_PER_KB: u64 = 1024;
pub const BYTES_PER_MB: u64 = 1024 * 1024;
pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Bytes,
    KB,
    MB,
    GB,
}

impl SizeUnit {
    fn bytes_per(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::KB => BYTES_PER_KB,
            SizeUnit::MB => BYTES_PER_MB,
            SizeUnit::GB => BYTES_PER_GB,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SizeUnit::Bytes => "bytes",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
        }
    }

    /// Picks the largest unit whose threshold the byte count meets.
    fn from_magnitude(bytes: u64) -> Self {
        if bytes >= BYTES_PER_GB {
            SizeUnit::GB
        } else if bytes >= BYTES_PER_MB {
            SizeUnit::MB
        } else if bytes >= BYTES_PER_KB {
            SizeUnit::KB
        } else {
            SizeUnit::Bytes
        }
    }
}

/// Renders a byte count as a human-readable magnitude string for logging.
///
/// # Arguments
///
/// * `bytes` - Byte count. File sizes are never negative, hence unsigned.
/// * `unit` - Optional explicit unit; auto-selected from magnitude when None.
///
/// # Returns
///
/// `"<n> bytes"` below 1 KB, otherwise `"<whole>.<2 digits> <unit>"`. The
/// fraction is truncated, not rounded, so 1.999 MB renders as "1.99 MB".
pub fn format_size(bytes: u64, unit: Option<SizeUnit>) -> String {
    let unit = unit.unwrap_or_else(|| SizeUnit::from_magnitude(bytes));
    if unit == SizeUnit::Bytes {
        return format!("{} bytes", bytes);
    }
    let per = unit.bytes_per();
    let whole = bytes / per;
    let frac = (bytes % per) * 100 / per; // integer division truncates
    format!("{}.{:02} {}", whole, frac, unit.label())
}

/// Stats `path` and renders its size with `format_size`. Size reporting is
/// diagnostic only, so an inaccessible file degrades to 0 bytes instead of
/// raising.
pub fn format_file_size<P: AsRef<Path>>(path: P) -> String {
    let bytes = fs::metadata(path.as_ref()).map(|m| m.len()).unwrap_or(0);
    format_size(bytes, None)
}

/// Joins a relative path onto `cwd`; absolute paths pass through unchanged.
pub fn resolve_input_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Builds the per-file aligner output path for one input of a sample group.
/// The zero-padded sequence index keeps output names pairwise distinct when
/// a sample has more than one input file.
pub fn aligned_output_name(out_dir: &Path, sample_id: &str, index: usize) -> PathBuf {
    out_dir.join(format!(
        "{}_{:03}.{}.{}",
        sample_id, index, ALIGNED_SUFFIX, BAM_EXT
    ))
}

/// Builds the single merged artifact path for a sample.
pub fn merged_output_name(out_dir: &Path, sample_id: &str) -> PathBuf {
    out_dir.join(format!("{}.{}.{}", sample_id, MERGED_SUFFIX, BAM_EXT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_size_zero() {
        assert_eq!(format_size(0, None), "0 bytes");
    }

    #[test]
    fn test_format_size_below_one_kb() {
        assert_eq!(format_size(1023, None), "1023 bytes");
        assert_eq!(format_size(1, None), "1 bytes");
    }

    #[test]
    fn test_format_size_kb_boundary() {
        assert_eq!(format_size(1024, None), "1.00 KB");
        assert_eq!(format_size(1536, None), "1.50 KB");
    }

    #[test]
    fn test_format_size_gb_boundary() {
        assert_eq!(format_size(1_073_741_824, None), "1.00 GB");
    }

    #[test]
    fn test_format_size_truncates_instead_of_rounding() {
        // ~1.999 MB must not round up to 2.00 MB
        let bytes = 1024 * 1024 + 1023 * 1024;
        assert_eq!(format_size(bytes, None), "1.99 MB");
    }

    #[test]
    fn test_format_size_explicit_unit_overrides_magnitude() {
        assert_eq!(format_size(512, Some(SizeUnit::KB)), "0.50 KB");
        assert_eq!(format_size(1_073_741_824, Some(SizeUnit::MB)), "1024.00 MB");
        assert_eq!(format_size(0, Some(SizeUnit::GB)), "0.00 GB");
    }

    #[test]
    fn test_format_file_size_missing_file_is_zero() {
        assert_eq!(format_file_size("/no/such/file.bam"), "0 bytes");
    }

    #[test]
    fn test_format_file_size_reads_metadata() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&[0u8; 1536])?;
        file.flush()?;
        assert_eq!(format_file_size(file.path()), "1.50 KB");
        Ok(())
    }

    #[test]
    fn test_aligned_output_names_are_distinct() {
        let dir = Path::new("/tmp/out");
        let first = aligned_output_name(dir, "S1", 0);
        let second = aligned_output_name(dir, "S1", 1);
        assert_ne!(first, second);
        assert_eq!(first, PathBuf::from("/tmp/out/S1_000.aligned.bam"));
        assert_eq!(second, PathBuf::from("/tmp/out/S1_001.aligned.bam"));
    }

    #[test]
    fn test_merged_output_name() {
        let merged = merged_output_name(Path::new("/tmp/out"), "S1");
        assert_eq!(merged, PathBuf::from("/tmp/out/S1.merged.bam"));
    }

    #[test]
    fn test_resolve_input_path() {
        let cwd = Path::new("/work");
        assert_eq!(
            resolve_input_path(Path::new("a.fq"), cwd),
            PathBuf::from("/work/a.fq")
        );
        assert_eq!(
            resolve_input_path(Path::new("/data/a.fq"), cwd),
            PathBuf::from("/data/a.fq")
        );
    }
}
