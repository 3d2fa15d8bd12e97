use anyhow::Context;
use clap::Parser;
use smb_s3_sync::core::job::JobResult;
use smb_s3_sync::domain::ports::FileSource;
use smb_s3_sync::utils::error::ErrorSeverity;
use smb_s3_sync::utils::{logger, validation::Validate};
use smb_s3_sync::{
    CliArgs, DirectorySource, MockSource, S3Store, SmbSource, SyncConfig, SyncEngine, SyncError,
    SyncJob, TomlConfig,
};
use std::io::IsTerminal;

const RULE: &str = "======================================================================";

fn exit_code(e: &SyncError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,      // 警告，但成功
        ErrorSeverity::Medium => 2,   // 重試錯誤
        ErrorSeverity::High => 1,     // 設定或來源錯誤
        ErrorSeverity::Critical => 3, // 系統錯誤
    }
}

fn report_error(context: &str, e: &SyncError) -> i32 {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    exit_code(e)
}

async fn execute<F: FileSource>(
    source: F,
    config: &SyncConfig,
    monitor: bool,
) -> smb_s3_sync::Result<JobResult> {
    let store = S3Store::connect(config).await;
    let engine = SyncEngine::new(store, config.max_workers, config.dry_run)
        .with_progress(std::io::stderr().is_terminal());

    SyncJob::new(source, engine, config.layout(), config.bucket(), config.dry_run)
        .with_cache(config.use_cache)
        .with_monitoring(monitor)
        .run()
        .await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut config = SyncConfig::default();
    if let Some(path) = &args.config {
        TomlConfig::from_file(path)
            .with_context(|| format!("failed to load config file {}", path.display()))?
            .apply_to(&mut config);
    }
    args.apply_to(&mut config);

    // 初始化日誌
    if args.json_logs {
        logger::init_json_logger(&config.log_level, args.verbose);
    } else {
        logger::init_cli_logger(&config.log_level, args.verbose);
    }
    if args.verbose {
        tracing::debug!("Effective config: {:?}", config);
    }

    let layout = config.layout();
    if args.check_layout {
        match layout.ensure() {
            Ok(()) => {
                for dir in layout.dirs() {
                    println!("✅ {} is writable", dir.display());
                }
                return Ok(());
            }
            Err(e) => std::process::exit(report_error("Runtime layout check failed", &e)),
        }
    }

    tracing::info!("{}", RULE);
    tracing::info!("SMB TO S3 SYNC");
    tracing::info!("{}", RULE);
    tracing::info!("Mode: {}", config.mode_label());
    tracing::info!("Dry Run: {}", config.dry_run);
    tracing::info!("S3 Bucket: {}", config.bucket());
    tracing::info!("Max Workers: {}", config.max_workers);
    tracing::info!("{}", RULE);

    if let Err(e) = config.validate() {
        std::process::exit(report_error("Configuration validation failed", &e));
    }
    if let Err(e) = layout.ensure() {
        std::process::exit(report_error("Runtime directories unavailable", &e));
    }

    let result = if config.mock_mode {
        let source = MockSource::new(
            layout.mock_data_dir(),
            config.mock_num_files,
            config.s3_prefix.clone(),
        );
        execute(source, &config, args.monitor).await
    } else if let Some(dir) = &config.source_dir {
        let source = DirectorySource::new(dir, config.s3_prefix.clone());
        execute(source, &config, args.monitor).await
    } else {
        tracing::info!("Connecting to SMB share...");
        let source = SmbSource::new(config.smb.clone(), config.s3_prefix.clone());
        execute(source, &config, args.monitor).await
    };

    match result {
        Ok(job) => {
            if job.report.is_none() {
                tracing::warn!("⚠️ Sync finished without a written report");
            }
            if job.outcome.stats.failed > 0 {
                tracing::warn!(
                    "⚠️ Sync finished with {} failed files",
                    job.outcome.stats.failed
                );
                std::process::exit(2);
            }
            tracing::info!("✅ Sync completed!");
        }
        Err(e) => {
            let code = report_error("Sync failed", &e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
