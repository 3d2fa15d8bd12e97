use crate::domain::model::SyncItem;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub size: u64,
    pub modified: i64,
}

/// Keys already present in the bucket, as of the last successful upload.
#[derive(Debug, Clone, Default)]
pub struct SyncManifest {
    path: PathBuf,
    entries: BTreeMap<String, ManifestEntry>,
    dirty: bool,
}

impl SyncManifest {
    pub fn path_for(cache_dir: &Path, bucket: &str) -> PathBuf {
        let bucket = if bucket.is_empty() { "default" } else { bucket };
        cache_dir.join(format!("manifest-{}.json", bucket))
    }

    /// Loads the manifest for `bucket`; a missing or unreadable file yields an empty one.
    pub fn load(cache_dir: &Path, bucket: &str) -> Self {
        let path = Self::path_for(cache_dir, bucket);
        let entries = match std::fs::read(&path) {
            Ok(data) => match serde_json::from_slice(&data) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt manifest {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Cannot read manifest {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };

        tracing::debug!("Loaded {} manifest entries from {}", entries.len(), path.display());
        Self {
            path,
            entries,
            dirty: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_unchanged(&self, item: &SyncItem) -> bool {
        self.entries.get(&item.key).is_some_and(|entry| {
            entry.size == item.size && entry.modified == item.modified
        })
    }

    pub fn record(&mut self, item: &SyncItem) {
        self.entries.insert(
            item.key.clone(),
            ManifestEntry {
                size: item.size,
                modified: item.modified,
            },
        );
        self.dirty = true;
    }

    /// Writes through a temp file and rename so a crash never leaves half a manifest.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(&self.entries)?)?;
        std::fs::rename(&tmp, &self.path)?;

        self.dirty = false;
        tracing::debug!("Saved {} manifest entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(key: &str, size: u64, modified: i64) -> SyncItem {
        SyncItem::new(format!("/src/{key}"), key, size, modified)
    }

    #[test]
    fn test_record_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = SyncManifest::load(temp_dir.path(), "bucket-a");
        assert!(manifest.is_empty());

        manifest.record(&item("a.txt", 10, 100));
        manifest.save().unwrap();

        let reloaded = SyncManifest::load(temp_dir.path(), "bucket-a");
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.is_unchanged(&item("a.txt", 10, 100)));
        assert!(!reloaded.is_unchanged(&item("a.txt", 11, 100)));
        assert!(!reloaded.is_unchanged(&item("a.txt", 10, 101)));
        assert!(!reloaded.is_unchanged(&item("b.txt", 10, 100)));

        // manifests are per bucket
        assert!(SyncManifest::load(temp_dir.path(), "bucket-b").is_empty());
    }

    #[test]
    fn test_corrupt_manifest_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(SyncManifest::path_for(temp_dir.path(), "x"), b"{not json").unwrap();
        assert!(SyncManifest::load(temp_dir.path(), "x").is_empty());
    }

    #[test]
    fn test_save_without_changes_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut manifest = SyncManifest::load(temp_dir.path(), "x");
        manifest.save().unwrap();
        assert!(!SyncManifest::path_for(temp_dir.path(), "x").exists());
    }
}
