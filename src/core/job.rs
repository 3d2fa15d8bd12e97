use crate::adapters::cache::SyncManifest;
use crate::adapters::report::{ReportWriter, WrittenReport};
use crate::core::engine::{SyncEngine, SyncOutcome};
use crate::domain::model::SyncReport;
use crate::domain::ports::{FileSource, ObjectStore};
use crate::utils::error::Result;
use crate::utils::layout::RuntimeLayout;
use crate::utils::monitor::ProcessMonitor;

/// One end-to-end run: list the source, sync it, write the report.
pub struct SyncJob<F: FileSource, S: ObjectStore + 'static> {
    source: F,
    engine: SyncEngine<S>,
    layout: RuntimeLayout,
    bucket: String,
    dry_run: bool,
    use_cache: bool,
    monitor: ProcessMonitor,
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub outcome: SyncOutcome,
    /// `None` when the run finished but its report could not be written.
    pub report: Option<WrittenReport>,
}

impl<F: FileSource, S: ObjectStore + 'static> SyncJob<F, S> {
    pub fn new(
        source: F,
        engine: SyncEngine<S>,
        layout: RuntimeLayout,
        bucket: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            source,
            engine,
            layout,
            bucket: bucket.into(),
            dry_run,
            use_cache: true,
            monitor: ProcessMonitor::disabled(),
        }
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = ProcessMonitor::new(enabled);
        self
    }

    pub async fn run(&self) -> Result<JobResult> {
        let started_at = chrono::Utc::now();
        self.monitor.checkpoint("Start");

        tracing::info!("📂 Listing files from {}", self.source.describe());
        let files = self.source.list_files().await?;
        tracing::info!("Found {} files to consider", files.len());
        self.monitor.checkpoint("Listing");

        let mut manifest = if self.use_cache {
            let manifest = SyncManifest::load(&self.layout.cache, &self.bucket);
            if !manifest.is_empty() {
                tracing::info!("Cache manifest knows {} objects", manifest.len());
            }
            Some(manifest)
        } else {
            None
        };

        let outcome = self.engine.sync(files, manifest.as_mut()).await;
        self.monitor.checkpoint("Upload");

        if let Some(manifest) = manifest.as_mut() {
            if let Err(e) = manifest.save() {
                tracing::warn!("Could not save cache manifest: {}", e);
            }
        }

        let stats = &outcome.stats;
        let report = SyncReport {
            started_at,
            finished_at: chrono::Utc::now(),
            source: self.source.describe(),
            destination: self.engine.store().location(""),
            dry_run: self.dry_run,
            total_files: stats.total(),
            successful: stats.success,
            failed: stats.failed,
            skipped: stats.skipped,
            bytes_transferred: stats.bytes_transferred,
            elapsed_seconds: stats.elapsed.as_secs_f64(),
            files_per_second: stats.rate(),
            failures: outcome.failures.clone(),
        };
        let report = match ReportWriter::new(&self.layout.logs).write(&report) {
            Ok(written) => Some(written),
            Err(e) => {
                tracing::error!(
                    "Could not write sync report to {}: {}",
                    self.layout.logs.display(),
                    e
                );
                None
            }
        };

        self.monitor.finish();
        Ok(JobResult { outcome, report })
    }
}
