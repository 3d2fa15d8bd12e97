use crate::adapters::cache::SyncManifest;
use crate::domain::model::{FailedItem, SyncItem, SyncStats, UploadOutcome, PROJECTION_FILES};
use crate::domain::ports::ObjectStore;
use crate::utils::format::{format_bytes, format_count};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{self, JoinError, JoinSet};

type Joined = std::result::Result<(task::Id, (SyncItem, UploadOutcome)), JoinError>;

const RULE: &str = "======================================================================";

#[derive(Debug, Clone, Default)]
pub struct SyncOutcome {
    pub stats: SyncStats,
    pub failures: Vec<FailedItem>,
}

/// Uploads a file list through an [`ObjectStore`] with a bounded number of in-flight uploads.
pub struct SyncEngine<S: ObjectStore + 'static> {
    store: Arc<S>,
    max_workers: usize,
    dry_run: bool,
    show_progress: bool,
}

impl<S: ObjectStore + 'static> SyncEngine<S> {
    pub fn new(store: S, max_workers: usize, dry_run: bool) -> Self {
        Self {
            store: Arc::new(store),
            max_workers: max_workers.max(1),
            dry_run,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "Uploading [{elapsed_precise}] {bar:40.green/blue} {pos}/{len} files {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }

    /// Syncs `files`, skipping those `manifest` already knows unchanged.
    ///
    /// Individual failures are logged and counted; they never stop the run.
    pub async fn sync(
        &self,
        files: Vec<SyncItem>,
        mut manifest: Option<&mut SyncManifest>,
    ) -> SyncOutcome {
        if files.is_empty() {
            tracing::warn!("No files to sync");
            return SyncOutcome::default();
        }

        tracing::info!(
            "{}Syncing {} files with {} workers",
            if self.dry_run { "DRY RUN: " } else { "" },
            files.len(),
            self.max_workers
        );

        let start = Instant::now();
        let mut outcome = SyncOutcome::default();
        let pb = self.progress_bar(files.len() as u64);
        let mut tasks: JoinSet<(SyncItem, UploadOutcome)> = JoinSet::new();
        // key and path of every in-flight upload, so a panicked task is still reported
        let mut pending: HashMap<task::Id, FailedItem> = HashMap::new();

        for item in files {
            if manifest.as_deref().is_some_and(|m| m.is_unchanged(&item)) {
                tracing::debug!("Unchanged, skipping {}", item.key);
                let skipped = UploadOutcome::Skipped { key: item.key.clone() };
                self.handle(&mut outcome, &pb, start, &mut manifest, item, skipped);
                continue;
            }

            while tasks.len() >= self.max_workers {
                if let Some(joined) = tasks.join_next_with_id().await {
                    self.handle_joined(
                        &mut outcome,
                        &pb,
                        start,
                        &mut manifest,
                        &mut pending,
                        joined,
                    );
                }
            }

            let placeholder = FailedItem {
                local_path: item.local_path.display().to_string(),
                key: item.key.clone(),
                error: String::new(),
            };
            let store = Arc::clone(&self.store);
            let dry_run = self.dry_run;
            let handle = tasks.spawn(async move {
                let result = upload_one(store.as_ref(), &item, dry_run).await;
                (item, result)
            });
            pending.insert(handle.id(), placeholder);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            self.handle_joined(
                &mut outcome,
                &pb,
                start,
                &mut manifest,
                &mut pending,
                joined,
            );
        }

        pb.finish_and_clear();
        outcome.stats.elapsed = start.elapsed();
        log_summary(&outcome.stats);
        outcome
    }

    fn handle_joined(
        &self,
        outcome: &mut SyncOutcome,
        pb: &ProgressBar,
        start: Instant,
        manifest: &mut Option<&mut SyncManifest>,
        pending: &mut HashMap<task::Id, FailedItem>,
        joined: Joined,
    ) {
        match joined {
            Ok((id, (item, result))) => {
                pending.remove(&id);
                self.handle(outcome, pb, start, manifest, item, result);
            }
            Err(e) => {
                let mut failure = pending.remove(&e.id()).unwrap_or_else(|| FailedItem {
                    local_path: String::new(),
                    key: String::new(),
                    error: String::new(),
                });
                failure.error = format!("upload task failed: {}", e);
                outcome.stats.failed += 1;
                tracing::error!("{}: {}", failure.local_path, failure.error);
                outcome.failures.push(failure);
                pb.inc(1);
            }
        }
    }

    fn handle(
        &self,
        outcome: &mut SyncOutcome,
        pb: &ProgressBar,
        start: Instant,
        manifest: &mut Option<&mut SyncManifest>,
        item: SyncItem,
        result: UploadOutcome,
    ) {
        outcome.stats.record(&result);
        match result {
            UploadOutcome::Uploaded { .. } => {
                if !self.dry_run {
                    if let Some(manifest) = manifest.as_deref_mut() {
                        manifest.record(&item);
                    }
                }
            }
            UploadOutcome::Skipped { .. } => {}
            UploadOutcome::Failed(failure) => {
                tracing::error!("{}: {}", failure.local_path, failure.error);
                outcome.failures.push(failure);
            }
        }

        pb.inc(1);
        if outcome.stats.success > 0 {
            let elapsed = start.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                outcome.stats.success as f64 / elapsed
            } else {
                0.0
            };
            pb.set_message(format!(
                "rate: {:.1} files/s, failed: {}",
                rate, outcome.stats.failed
            ));
        }
    }
}

async fn upload_one<S: ObjectStore + ?Sized>(
    store: &S,
    item: &SyncItem,
    dry_run: bool,
) -> UploadOutcome {
    if dry_run {
        tracing::debug!(
            "DRY RUN: Would upload {} -> {}",
            item.local_path.display(),
            store.location(&item.key)
        );
        return UploadOutcome::Uploaded {
            key: item.key.clone(),
            bytes: item.size,
        };
    }

    match store.upload(item).await {
        Ok(bytes) => UploadOutcome::Uploaded {
            key: item.key.clone(),
            bytes,
        },
        Err(e) => UploadOutcome::Failed(FailedItem {
            local_path: item.local_path.display().to_string(),
            key: item.key.clone(),
            error: e.to_string(),
        }),
    }
}

pub fn log_summary(stats: &SyncStats) {
    tracing::info!("{}", RULE);
    tracing::info!("SYNC SUMMARY");
    tracing::info!("{}", RULE);
    tracing::info!("  Total files:      {}", format_count(stats.total()));
    tracing::info!("  Successful:       {}", format_count(stats.success));
    tracing::info!("  Failed:           {}", format_count(stats.failed));
    tracing::info!("  Skipped:          {}", format_count(stats.skipped));
    tracing::info!("  Data transferred: {}", format_bytes(stats.bytes_transferred));
    tracing::info!("  Time elapsed:     {:.2}s", stats.elapsed.as_secs_f64());
    tracing::info!("  Upload rate:      {:.2} files/s", stats.rate());

    if stats.total() > 0 {
        tracing::info!(
            "  Estimated for 3M files: {:.2} hours",
            stats.estimated_hours(PROJECTION_FILES)
        );
    }

    tracing::info!("{}", RULE);
}
