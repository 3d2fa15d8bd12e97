mod common;

use common::{s3_client, BUCKET};
use httpmock::prelude::*;
use smb_s3_sync::{
    DirectorySource, MockSource, RuntimeLayout, S3Store, SyncEngine, SyncError, SyncJob,
    TransferSettings,
};
use tempfile::TempDir;

fn engine(server: &MockServer, dry_run: bool) -> SyncEngine<S3Store> {
    let store = S3Store::new(s3_client(server), BUCKET, "STANDARD", TransferSettings::default());
    SyncEngine::new(store, 4, dry_run).with_progress(false)
}

#[tokio::test]
async fn test_mock_data_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let layout = RuntimeLayout::new(temp_dir.path());
    layout.ensure().unwrap();

    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path_contains("/test-bucket/backup/dir_0000/");
            then.status(200).header("ETag", "\"etag\"");
        })
        .await;

    let source = MockSource::new(layout.mock_data_dir(), 15, "backup");
    let job = SyncJob::new(source, engine(&server, false), layout.clone(), BUCKET, false);

    let result = job.run().await.unwrap();

    assert_eq!(result.outcome.stats.success, 15);
    assert_eq!(result.outcome.stats.failed, 0);
    assert_eq!(result.outcome.stats.bytes_transferred, 15 * 100 * 1024);
    assert_eq!(put.hits_async().await, 15);

    let report = result.report.expect("written report");
    assert!(report.summary.starts_with(&layout.logs));
    assert!(report.failures.is_none());
    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report.summary).unwrap()).unwrap();
    assert_eq!(summary["successful"], 15);
    assert_eq!(summary["destination"], "s3://test-bucket/");
}

#[tokio::test]
async fn test_second_run_skips_unchanged_files() {
    let temp_dir = TempDir::new().unwrap();
    let layout = RuntimeLayout::new(temp_dir.path().join("app"));
    layout.ensure().unwrap();

    let data = temp_dir.path().join("share");
    std::fs::create_dir_all(data.join("sub")).unwrap();
    std::fs::write(data.join("a.txt"), b"alpha").unwrap();
    std::fs::write(data.join("sub/b.txt"), b"beta").unwrap();

    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path_contains("/test-bucket/");
            then.status(200).header("ETag", "\"etag\"");
        })
        .await;

    let first = SyncJob::new(
        DirectorySource::new(&data, ""),
        engine(&server, false),
        layout.clone(),
        BUCKET,
        false,
    )
    .run()
    .await
    .unwrap();
    assert_eq!(first.outcome.stats.success, 2);
    assert!(layout.cache.join("manifest-test-bucket.json").is_file());

    let second = SyncJob::new(
        DirectorySource::new(&data, ""),
        engine(&server, false),
        layout.clone(),
        BUCKET,
        false,
    )
    .run()
    .await
    .unwrap();
    assert_eq!(second.outcome.stats.success, 0);
    assert_eq!(second.outcome.stats.skipped, 2);
    assert_eq!(put.hits_async().await, 2);

    // without the cache everything goes up again
    let third = SyncJob::new(
        DirectorySource::new(&data, ""),
        engine(&server, false),
        layout.clone(),
        BUCKET,
        false,
    )
    .with_cache(false)
    .run()
    .await
    .unwrap();
    assert_eq!(third.outcome.stats.success, 2);
    assert_eq!(put.hits_async().await, 4);
}

#[tokio::test]
async fn test_failures_are_reported_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let layout = RuntimeLayout::new(temp_dir.path().join("app"));
    layout.ensure().unwrap();

    let data = temp_dir.path().join("share");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("ok.txt"), b"fine").unwrap();
    std::fs::write(data.join("locked.txt"), b"denied").unwrap();

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/test-bucket/ok.txt");
            then.status(200).header("ETag", "\"etag\"");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/test-bucket/locked.txt");
            then.status(403).body(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            );
        })
        .await;

    let result = SyncJob::new(
        DirectorySource::new(&data, ""),
        engine(&server, false),
        layout.clone(),
        BUCKET,
        false,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(result.outcome.stats.success, 1);
    assert_eq!(result.outcome.stats.failed, 1);
    assert_eq!(result.outcome.failures[0].key, "locked.txt");

    let csv_path = result
        .report
        .and_then(|report| report.failures)
        .expect("failures csv");
    let content = std::fs::read_to_string(csv_path).unwrap();
    assert!(content.starts_with("local_path,key,error"));
    assert!(content.contains("locked.txt"));
}

#[tokio::test]
async fn test_unwritable_logs_keep_sync_outcome() {
    let temp_dir = TempDir::new().unwrap();
    let layout = RuntimeLayout::new(temp_dir.path().join("app"));
    layout.ensure().unwrap();
    // a regular file where the logs directory should be
    std::fs::remove_dir_all(&layout.logs).unwrap();
    std::fs::write(&layout.logs, b"not a dir").unwrap();

    let data = temp_dir.path().join("share");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("one.txt"), b"payload").unwrap();

    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT).path("/test-bucket/one.txt");
            then.status(200).header("ETag", "\"etag\"");
        })
        .await;

    let result = SyncJob::new(
        DirectorySource::new(&data, ""),
        engine(&server, false),
        layout.clone(),
        BUCKET,
        false,
    )
    .run()
    .await
    .unwrap();

    assert_eq!(put.hits_async().await, 1);
    assert_eq!(result.outcome.stats.success, 1);
    assert_eq!(result.outcome.stats.failed, 0);
    assert!(result.report.is_none());
    // the manifest is still saved
    assert!(layout.cache.join("manifest-test-bucket.json").is_file());
}

#[tokio::test]
async fn test_dry_run_sends_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let layout = RuntimeLayout::new(temp_dir.path());
    layout.ensure().unwrap();

    let server = MockServer::start_async().await;
    let any = server
        .mock_async(|when, then| {
            when.path_contains("/");
            then.status(200);
        })
        .await;

    let source = MockSource::new(layout.mock_data_dir(), 10, "");
    let result = SyncJob::new(source, engine(&server, true), layout.clone(), BUCKET, true)
        .run()
        .await
        .unwrap();

    assert_eq!(result.outcome.stats.success, 10);
    assert_eq!(any.hits_async().await, 0);
    // dry runs never populate the manifest
    assert!(!layout.cache.join("manifest-test-bucket.json").exists());
}

#[tokio::test]
async fn test_unavailable_source_fails_job() {
    let temp_dir = TempDir::new().unwrap();
    let layout = RuntimeLayout::new(temp_dir.path());
    layout.ensure().unwrap();

    let server = MockServer::start_async().await;
    let err = SyncJob::new(
        DirectorySource::new(temp_dir.path().join("missing"), ""),
        engine(&server, false),
        layout,
        BUCKET,
        false,
    )
    .run()
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::SourceUnavailable { .. }));
}
