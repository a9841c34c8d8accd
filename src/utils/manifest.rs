// Parsing and resolution of the tab-separated batch manifest that drives
// per-sample alignment.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::config::defs::{
    MANIFEST_FAILED_COLUMN, MANIFEST_FILE_COLUMN, MANIFEST_SAMPLE_COLUMN, PipelineError,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BatchRow {
    pub alignment_file: PathBuf,
    pub sample_id: String,
    pub failed_target: bool,
}

/// The ordered list of input files belonging to one sample identifier after
/// excluding failed-target rows. A group with no files is valid: it means
/// every row for that sample was flagged as failed upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGroup {
    pub sample_id: String,
    pub files: Vec<PathBuf>,
}

/// Mapping from sample identifier to its group, in first-seen sample order.
/// Immutable once constructed.
#[derive(Debug, Default, PartialEq)]
pub struct ResolvedBatch {
    groups: Vec<SampleGroup>,
    index: HashMap<String, usize>,
    skipped: usize,
}

impl ResolvedBatch {
    pub fn groups(&self) -> &[SampleGroup] {
        &self.groups
    }

    pub fn get(&self, sample_id: &str) -> Option<&SampleGroup> {
        self.index.get(sample_id).map(|&i| &self.groups[i])
    }

    /// Number of manifest rows excluded because failed_target was true.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

struct HeaderIndex {
    file: usize,
    sample: usize,
    failed: usize,
    width: usize,
}

impl HeaderIndex {
    fn parse(header: &str) -> Result<Self, PipelineError> {
        let columns: Vec<&str> = header.split('\t').collect();
        let position = |name: &str| -> Result<usize, PipelineError> {
            columns.iter().position(|c| *c == name).ok_or_else(|| {
                PipelineError::InvalidManifest {
                    line: 1,
                    reason: format!("missing required column '{}'", name),
                }
            })
        };
        Ok(HeaderIndex {
            file: position(MANIFEST_FILE_COLUMN)?,
            sample: position(MANIFEST_SAMPLE_COLUMN)?,
            failed: position(MANIFEST_FAILED_COLUMN)?,
            width: columns.len(),
        })
    }
}

/// Parses a batch manifest: UTF-8 TSV with a header row naming the columns
/// `alignment_file`, `sample_id` and `failed_target` in any order.
///
/// Any malformed row rejects the whole batch, since a partially-resolved
/// batch risks attributing alignment outputs to the wrong sample.
///
/// # Arguments
///
/// * `reader` - Buffered reader over the manifest contents.
///
/// # Returns
///
/// Rows in file order, or `PipelineError::InvalidManifest` carrying the
/// 1-based line number of the offending row.
pub fn parse_manifest<R: BufRead>(reader: R) -> Result<Vec<BatchRow>, PipelineError> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, Ok(line))) => line,
        Some((_, Err(e))) => return Err(PipelineError::IOError(e.to_string())),
        None => {
            return Err(PipelineError::InvalidManifest {
                line: 1,
                reason: "manifest is empty".to_string(),
            });
        }
    };
    let header = header.trim_end_matches('\r');
    let index = HeaderIndex::parse(header)?;

    let mut rows = Vec::new();
    for (i, line) in lines {
        let line_no = i + 1;
        let line = line.map_err(|e| PipelineError::IOError(e.to_string()))?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < index.width {
            return Err(PipelineError::InvalidManifest {
                line: line_no,
                reason: format!(
                    "expected {} columns, found {}",
                    index.width,
                    fields.len()
                ),
            });
        }

        let alignment_file = fields[index.file];
        if alignment_file.is_empty() {
            return Err(PipelineError::InvalidManifest {
                line: line_no,
                reason: format!("empty {} value", MANIFEST_FILE_COLUMN),
            });
        }
        let sample_id = fields[index.sample];
        if sample_id.is_empty() {
            return Err(PipelineError::InvalidManifest {
                line: line_no,
                reason: format!("empty {} value", MANIFEST_SAMPLE_COLUMN),
            });
        }
        // Only the literal, case-sensitive strings are accepted.
        let failed_target = match fields[index.failed] {
            "true" => true,
            "false" => false,
            other => {
                return Err(PipelineError::InvalidManifest {
                    line: line_no,
                    reason: format!(
                        "{} must be 'true' or 'false', found '{}'",
                        MANIFEST_FAILED_COLUMN, other
                    ),
                });
            }
        };

        rows.push(BatchRow {
            alignment_file: PathBuf::from(alignment_file),
            sample_id: sample_id.to_string(),
            failed_target,
        });
    }

    Ok(rows)
}

/// Opens and parses the manifest at `path`.
pub fn read_manifest(path: &Path) -> Result<Vec<BatchRow>, PipelineError> {
    let file = File::open(path).map_err(|e| {
        PipelineError::IOError(format!("cannot open manifest {}: {}", path.display(), e))
    })?;
    parse_manifest(BufReader::new(file))
}

/// Groups manifest rows by sample in a single pass.
///
/// Rows flagged failed_target are counted as skipped and contribute no file,
/// but still create the sample's group so an all-failed sample resolves to a
/// valid empty group. Duplicate rows are preserved as-is; file order within
/// a group follows manifest row order.
pub fn resolve_batch(rows: &[BatchRow]) -> ResolvedBatch {
    let mut batch = ResolvedBatch::default();
    for row in rows {
        let group_idx = match batch.index.get(&row.sample_id) {
            Some(&i) => i,
            None => {
                batch.groups.push(SampleGroup {
                    sample_id: row.sample_id.clone(),
                    files: Vec::new(),
                });
                let i = batch.groups.len() - 1;
                batch.index.insert(row.sample_id.clone(), i);
                i
            }
        };
        if row.failed_target {
            batch.skipped += 1;
        } else {
            batch.groups[group_idx]
                .files
                .push(row.alignment_file.clone());
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Vec<BatchRow>, PipelineError> {
        parse_manifest(Cursor::new(text))
    }

    const VALID: &str = "alignment_file\tsample_id\tfailed_target\n\
                         a.fq\tS1\tfalse\n\
                         b.fq\tS1\tfalse\n\
                         c.fq\tS2\ttrue\n";

    #[test]
    fn test_resolve_groups_and_skips() {
        let rows = parse(VALID).unwrap();
        assert_eq!(rows.len(), 3);
        let batch = resolve_batch(&rows);

        let s1 = batch.get("S1").unwrap();
        assert_eq!(s1.files, vec![PathBuf::from("a.fq"), PathBuf::from("b.fq")]);

        // All rows for S2 failed: empty terminal group, still present.
        let s2 = batch.get("S2").unwrap();
        assert!(s2.files.is_empty());

        assert_eq!(batch.skipped(), 1);
        assert_eq!(batch.total_files(), rows.len() - batch.skipped());
    }

    #[test]
    fn test_groups_in_first_seen_order() {
        let text = "alignment_file\tsample_id\tfailed_target\n\
                    x.fq\tB\tfalse\n\
                    y.fq\tA\tfalse\n\
                    z.fq\tB\tfalse\n";
        let batch = resolve_batch(&parse(text).unwrap());
        let order: Vec<&str> = batch.groups().iter().map(|g| g.sample_id.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
        assert_eq!(
            batch.get("B").unwrap().files,
            vec![PathBuf::from("x.fq"), PathBuf::from("z.fq")]
        );
    }

    #[test]
    fn test_header_columns_in_any_order() {
        let text = "failed_target\talignment_file\tsample_id\n\
                    false\ta.fq\tS1\n";
        let rows = parse(text).unwrap();
        assert_eq!(rows[0].alignment_file, PathBuf::from("a.fq"));
        assert_eq!(rows[0].sample_id, "S1");
        assert!(!rows[0].failed_target);
    }

    #[test]
    fn test_duplicate_rows_are_preserved() {
        let text = "alignment_file\tsample_id\tfailed_target\n\
                    a.fq\tS1\tfalse\n\
                    a.fq\tS1\tfalse\n";
        let batch = resolve_batch(&parse(text).unwrap());
        assert_eq!(batch.get("S1").unwrap().files.len(), 2);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let rows = parse(VALID).unwrap();
        assert_eq!(resolve_batch(&rows), resolve_batch(&rows));
    }

    #[test]
    fn test_missing_column_rejected() {
        let text = "alignment_file\tsample_id\n\
                    a.fq\tS1\n";
        match parse(text) {
            Err(PipelineError::InvalidManifest { line, reason }) => {
                assert_eq!(line, 1);
                assert!(reason.contains("failed_target"));
            }
            other => panic!("expected InvalidManifest, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_sample_id_rejects_whole_batch() {
        let text = "alignment_file\tsample_id\tfailed_target\n\
                    a.fq\tS1\tfalse\n\
                    b.fq\t\tfalse\n";
        match parse(text) {
            Err(PipelineError::InvalidManifest { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected InvalidManifest, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_boolean_is_case_sensitive() {
        let text = "alignment_file\tsample_id\tfailed_target\n\
                    a.fq\tS1\tTrue\n";
        assert!(matches!(
            parse(text),
            Err(PipelineError::InvalidManifest { line: 2, .. })
        ));
    }

    #[test]
    fn test_short_row_rejected() {
        let text = "alignment_file\tsample_id\tfailed_target\n\
                    a.fq\tS1\n";
        assert!(matches!(
            parse(text),
            Err(PipelineError::InvalidManifest { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_manifest_rejected() {
        assert!(matches!(
            parse(""),
            Err(PipelineError::InvalidManifest { line: 1, .. })
        ));
    }

    #[test]
    fn test_blank_lines_and_crlf_tolerated() {
        let text = "alignment_file\tsample_id\tfailed_target\r\n\
                    a.fq\tS1\tfalse\r\n\
                    \n";
        let rows = parse(text).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sample_id, "S1");
    }
}
