use crate::domain::model::SyncReport;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub summary: PathBuf,
    pub failures: Option<PathBuf>,
}

/// Persists run reports into the logs directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    logs_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn write(&self, report: &SyncReport) -> Result<WrittenReport> {
        std::fs::create_dir_all(&self.logs_dir)?;
        let stamp = report.finished_at.format("%Y%m%dT%H%M%SZ");

        let summary = self.logs_dir.join(format!("sync-report-{}.json", stamp));
        std::fs::write(&summary, serde_json::to_string_pretty(report)?)?;

        let failures = if report.failures.is_empty() {
            None
        } else {
            let path = self.logs_dir.join(format!("sync-failures-{}.csv", stamp));
            let mut writer = csv::Writer::from_path(&path)?;
            for failure in &report.failures {
                writer.serialize(failure)?;
            }
            writer.flush()?;
            Some(path)
        };

        tracing::info!("📝 Report written to {}", summary.display());
        if let Some(path) = &failures {
            tracing::info!("📝 Failed files listed in {}", path.display());
        }

        Ok(WrittenReport { summary, failures })
    }
}
