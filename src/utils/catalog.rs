// Sample catalog: the on-disk record of merged artifacts keyed by sample_id.
// Concurrent tasks on shared storage read and update this file, so writes go
// through a temp file in the destination directory followed by an atomic
// rename.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::defs::PipelineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub merged_path: PathBuf,
    pub aligned_inputs: Vec<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleCatalog {
    samples: BTreeMap<String, CatalogRecord>,
}

impl SampleCatalog {
    /// Loads the catalog at `path`. A missing or empty file yields an empty
    /// catalog; unparsable contents are an error.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Ok(SampleCatalog::default());
        }
        let data = fs::read_to_string(path).map_err(|e| {
            PipelineError::IOError(format!("cannot read catalog {}: {}", path.display(), e))
        })?;
        if data.trim().is_empty() {
            return Ok(SampleCatalog::default());
        }
        serde_json::from_str(&data).map_err(|e| {
            PipelineError::IOError(format!("invalid catalog {}: {}", path.display(), e))
        })
    }

    /// Records the merged artifact for a sample, replacing any previous entry.
    pub fn record(&mut self, sample_id: &str, merged_path: PathBuf, aligned_inputs: Vec<PathBuf>) {
        self.samples.insert(
            sample_id.to_string(),
            CatalogRecord {
                merged_path,
                aligned_inputs,
            },
        );
    }

    pub fn get(&self, sample_id: &str) -> Option<&CatalogRecord> {
        self.samples.get(sample_id)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| {
            PipelineError::IOError(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let tmp = NamedTempFile::new_in(dir)
            .map_err(|e| PipelineError::IOError(e.to_string()))?;
        serde_json::to_writer_pretty(tmp.as_file(), self)
            .map_err(|e| PipelineError::IOError(e.to_string()))?;
        tmp.persist(path).map_err(|e| {
            PipelineError::IOError(format!("cannot persist catalog {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_path_yields_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = SampleCatalog::load(&dir.path().join("absent.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_record_save_load_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sample_catalog.json");

        let mut catalog = SampleCatalog::default();
        catalog.record(
            "S1",
            PathBuf::from("/out/S1.merged.bam"),
            vec![PathBuf::from("/out/S1_000.aligned.bam")],
        );
        catalog.save(&path)?;

        let loaded = SampleCatalog::load(&path)?;
        assert_eq!(loaded, catalog);
        assert_eq!(
            loaded.get("S1").unwrap().merged_path,
            PathBuf::from("/out/S1.merged.bam")
        );
        Ok(())
    }

    #[test]
    fn test_incremental_saves_keep_earlier_samples() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sample_catalog.json");

        // Saved once per sample, as the batch loop does.
        let mut catalog = SampleCatalog::default();
        catalog.record("S1", PathBuf::from("/out/S1.merged.bam"), vec![]);
        catalog.save(&path)?;
        catalog.record("S2", PathBuf::from("/out/S2.merged.bam"), vec![]);
        catalog.save(&path)?;

        let loaded = SampleCatalog::load(&path)?;
        assert_eq!(loaded.len(), 2);
        assert!(loaded.get("S1").is_some());
        assert!(loaded.get("S2").is_some());

        // The first save alone already carried S1.
        let mut first_only = SampleCatalog::default();
        first_only.record("S1", PathBuf::from("/out/S1.merged.bam"), vec![]);
        let first_path = dir.path().join("first.json");
        first_only.save(&first_path)?;
        assert_eq!(SampleCatalog::load(&first_path)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_record_overwrites_existing_sample() {
        let mut catalog = SampleCatalog::default();
        catalog.record("S1", PathBuf::from("old.bam"), vec![]);
        catalog.record("S1", PathBuf::from("new.bam"), vec![PathBuf::from("a.bam")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("S1").unwrap().merged_path, PathBuf::from("new.bam"));
    }

    #[test]
    fn test_garbage_catalog_is_an_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sample_catalog.json");
        fs::write(&path, "not json")?;
        assert!(SampleCatalog::load(&path).is_err());
        Ok(())
    }
}
