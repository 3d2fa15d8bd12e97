use crate::config::SyncConfig;
use clap::builder::{BoolishValueParser, FalseyValueParser};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "smb-s3-sync")]
#[command(about = "Bulk sync of an SMB share (or any directory) into S3")]
pub struct CliArgs {
    /// Optional TOML config file, overridden by env vars and flags
    #[arg(short, long, env = "SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Use generated mock data instead of SMB
    #[arg(long, env = "MOCK_MODE", value_parser = FalseyValueParser::new())]
    pub mock: bool,

    /// Number of mock files to generate
    #[arg(long, env = "MOCK_NUM_FILES")]
    pub mock_files: Option<usize>,

    /// Only log what would be uploaded (defaults to true)
    #[arg(
        long,
        env = "DRY_RUN",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub dry_run: Option<bool>,

    /// Concurrent uploads
    #[arg(long, env = "MAX_WORKERS")]
    pub max_workers: Option<usize>,

    #[arg(long, env = "S3_BUCKET")]
    pub bucket: Option<String>,

    #[arg(long, env = "S3_PREFIX")]
    pub prefix: Option<String>,

    #[arg(long, env = "AWS_DEFAULT_REGION")]
    pub region: Option<String>,

    #[arg(long, env = "S3_STORAGE_CLASS")]
    pub storage_class: Option<String>,

    /// Custom S3 endpoint (MinIO, LocalStack); enables path-style addressing
    #[arg(long, env = "S3_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    #[arg(long, env = "SMB_SERVER")]
    pub smb_server: Option<String>,

    #[arg(long, env = "SMB_SHARE")]
    pub smb_share: Option<String>,

    #[arg(long, env = "SMB_USER")]
    pub smb_user: Option<String>,

    #[arg(long, env = "SMB_PASSWORD", hide_env_values = true)]
    pub smb_password: Option<String>,

    #[arg(long, env = "SMB_DOMAIN")]
    pub smb_domain: Option<String>,

    /// Local mount point of the SMB share
    #[arg(long, env = "SMB_MOUNT_PATH")]
    pub smb_mount_path: Option<PathBuf>,

    /// Sync an arbitrary local directory instead of the SMB share
    #[arg(long, env = "SYNC_SOURCE_DIR")]
    pub source_dir: Option<PathBuf>,

    /// Root holding the logs, cache and test-data directories
    #[arg(long, env = "APP_ROOT")]
    pub app_root: Option<PathBuf>,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Skip files recorded as unchanged in the cache manifest
    #[arg(
        long,
        env = "SYNC_USE_CACHE",
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub use_cache: Option<bool>,

    /// Upload everything, ignoring the cache manifest; wins over `--use-cache`
    #[arg(long)]
    pub no_cache: bool,

    /// Log process CPU and memory between phases
    #[arg(long)]
    pub monitor: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Verify the runtime directories and exit
    #[arg(long)]
    pub check_layout: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliArgs {
    /// Overlays flags and environment values onto `config`.
    pub fn apply_to(&self, config: &mut SyncConfig) {
        if let Some(region) = &self.region {
            config.aws_region = region.clone();
        }
        if self.bucket.is_some() {
            config.s3_bucket = self.bucket.clone();
        }
        if let Some(prefix) = &self.prefix {
            config.s3_prefix = prefix.clone();
        }
        if let Some(storage_class) = &self.storage_class {
            config.s3_storage_class = storage_class.clone();
        }
        if self.endpoint_url.is_some() {
            config.s3_endpoint_url = self.endpoint_url.clone();
        }

        if let Some(server) = &self.smb_server {
            config.smb.server = server.clone();
        }
        if let Some(share) = &self.smb_share {
            config.smb.share = share.clone();
        }
        if let Some(user) = &self.smb_user {
            config.smb.user = user.clone();
        }
        if let Some(password) = &self.smb_password {
            config.smb.password = password.clone();
        }
        if let Some(domain) = &self.smb_domain {
            config.smb.domain = domain.clone();
        }
        if self.smb_mount_path.is_some() {
            config.smb.mount_path = self.smb_mount_path.clone();
        }

        if let Some(max_workers) = self.max_workers {
            config.max_workers = max_workers;
        }
        if let Some(dry_run) = self.dry_run {
            config.dry_run = dry_run;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if self.mock {
            config.mock_mode = true;
        }
        if let Some(n) = self.mock_files {
            config.mock_num_files = n;
        }
        if self.source_dir.is_some() {
            config.source_dir = self.source_dir.clone();
        }
        if let Some(root) = &self.app_root {
            config.app_root = root.clone();
        }
        if let Some(use_cache) = self.use_cache {
            config.use_cache = use_cache;
        }
        if self.no_cache {
            config.use_cache = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = CliArgs::try_parse_from([
            "smb-s3-sync",
            "--mock",
            "--mock-files",
            "20",
            "--dry-run",
            "false",
            "--max-workers",
            "8",
            "--bucket",
            "test-bucket",
            "--no-cache",
        ])
        .unwrap();

        let mut config = SyncConfig::default();
        args.apply_to(&mut config);

        assert!(config.mock_mode);
        assert_eq!(config.mock_num_files, 20);
        assert!(!config.dry_run);
        assert_eq!(config.max_workers, 8);
        assert_eq!(config.s3_bucket.as_deref(), Some("test-bucket"));
        assert!(!config.use_cache);
    }

    #[test]
    fn test_bare_dry_run_flag_means_true() {
        let args = CliArgs::try_parse_from(["smb-s3-sync", "--dry-run"]).unwrap();
        assert_eq!(args.dry_run, Some(true));

        let args = CliArgs::try_parse_from(["smb-s3-sync", "--dry-run", "no"]).unwrap();
        assert_eq!(args.dry_run, Some(false));
    }

    #[test]
    fn test_no_cache_wins_over_use_cache() {
        let args =
            CliArgs::try_parse_from(["smb-s3-sync", "--no-cache", "--use-cache", "true"]).unwrap();

        let mut config = SyncConfig::default();
        args.apply_to(&mut config);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_no_cache_overrides_env_use_cache() {
        std::env::set_var("SYNC_USE_CACHE", "true");
        let parsed = CliArgs::try_parse_from(["smb-s3-sync", "--no-cache"]);
        std::env::remove_var("SYNC_USE_CACHE");

        let args = parsed.unwrap();
        assert_eq!(args.use_cache, Some(true));

        let mut config = SyncConfig::default();
        args.apply_to(&mut config);
        assert!(!config.use_cache);
    }
}
