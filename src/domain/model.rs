use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Projection target printed with every summary.
pub const PROJECTION_FILES: u64 = 3_000_000;

/// One local file and the object key it is uploaded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    pub local_path: PathBuf,
    pub key: String,
    pub size: u64,
    /// Modification time in unix seconds, 0 when unknown.
    pub modified: i64,
}

impl SyncItem {
    pub fn new(
        local_path: impl Into<PathBuf>,
        key: impl Into<String>,
        size: u64,
        modified: i64,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            key: key.into(),
            size,
            modified,
        }
    }

    /// Builds an item from filesystem metadata of `local_path`.
    pub fn from_path(
        local_path: impl Into<PathBuf>,
        key: impl Into<String>,
    ) -> std::io::Result<Self> {
        let local_path = local_path.into();
        let metadata = std::fs::metadata(&local_path)?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Ok(Self::new(local_path, key, metadata.len(), modified))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedItem {
    pub local_path: String,
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded { key: String, bytes: u64 },
    Skipped { key: String },
    Failed(FailedItem),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    pub success: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bytes_transferred: u64,
    pub elapsed: Duration,
}

impl SyncStats {
    pub fn total(&self) -> u64 {
        self.success + self.failed + self.skipped
    }

    /// Successful uploads per second.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.success as f64 / secs
        } else {
            0.0
        }
    }

    /// Hours needed for `total_files` at the current rate, 0 when nothing succeeded yet.
    pub fn estimated_hours(&self, total_files: u64) -> f64 {
        let rate = self.rate();
        if rate > 0.0 {
            total_files as f64 / rate / 3600.0
        } else {
            0.0
        }
    }

    pub fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Uploaded { bytes, .. } => {
                self.success += 1;
                self.bytes_transferred += bytes;
            }
            UploadOutcome::Skipped { .. } => self.skipped += 1,
            UploadOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// What a finished run leaves behind in the logs directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub source: String,
    pub destination: String,
    pub dry_run: bool,
    pub total_files: u64,
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bytes_transferred: u64,
    pub elapsed_seconds: f64,
    pub files_per_second: f64,
    pub failures: Vec<FailedItem>,
}
