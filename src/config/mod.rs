#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{Result, SyncError};
use crate::utils::layout::RuntimeLayout;
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_STORAGE_CLASS: &str = "INTELLIGENT_TIERING";
pub const DEFAULT_MAX_WORKERS: usize = 50;
pub const DEFAULT_MOCK_FILES: usize = 100;
pub const MAX_WORKERS_LIMIT: usize = 1000;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SmbConfig {
    pub server: String,
    pub share: String,
    pub user: String,
    pub password: String,
    pub domain: String,
    /// Where the share is mounted on this host.
    pub mount_path: Option<PathBuf>,
}

impl SmbConfig {
    /// Explicit mount path, or `/mnt/<server>/<share>` when only the share is named.
    pub fn resolved_mount_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.mount_path {
            return Some(path.clone());
        }
        if self.server.is_empty() {
            return None;
        }
        let mut path = PathBuf::from("/mnt").join(&self.server);
        if !self.share.is_empty() {
            path.push(&self.share);
        }
        Some(path)
    }

    pub fn unc(&self) -> String {
        format!("//{}/{}", self.server, self.share)
    }
}

impl std::fmt::Debug for SmbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmbConfig")
            .field("server", &self.server)
            .field("share", &self.share)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("domain", &self.domain)
            .field("mount_path", &self.mount_path)
            .finish()
    }
}

/// Effective settings for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub aws_region: String,
    pub s3_bucket: Option<String>,
    pub s3_prefix: String,
    pub s3_storage_class: String,
    pub s3_endpoint_url: Option<String>,
    pub smb: SmbConfig,
    pub max_workers: usize,
    pub dry_run: bool,
    pub log_level: String,
    pub mock_mode: bool,
    pub mock_num_files: usize,
    pub source_dir: Option<PathBuf>,
    pub app_root: PathBuf,
    pub use_cache: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            aws_region: DEFAULT_REGION.to_string(),
            s3_bucket: None,
            s3_prefix: String::new(),
            s3_storage_class: DEFAULT_STORAGE_CLASS.to_string(),
            s3_endpoint_url: None,
            smb: SmbConfig::default(),
            max_workers: DEFAULT_MAX_WORKERS,
            dry_run: true,
            log_level: "INFO".to_string(),
            mock_mode: false,
            mock_num_files: DEFAULT_MOCK_FILES,
            source_dir: None,
            app_root: PathBuf::from("."),
            use_cache: true,
        }
    }
}

impl SyncConfig {
    pub fn layout(&self) -> RuntimeLayout {
        RuntimeLayout::new(&self.app_root)
    }

    pub fn bucket(&self) -> &str {
        self.s3_bucket.as_deref().unwrap_or("")
    }

    pub fn mode_label(&self) -> &'static str {
        if self.mock_mode {
            "MOCK"
        } else if self.source_dir.is_some() {
            "LOCAL"
        } else {
            "PRODUCTION"
        }
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_range("max_workers", self.max_workers, 1, MAX_WORKERS_LIMIT)?;
        validation::validate_aws_region("aws_region", &self.aws_region)?;
        validation::validate_storage_class("s3_storage_class", &self.s3_storage_class)?;

        if let Some(endpoint) = &self.s3_endpoint_url {
            validation::validate_url("s3_endpoint_url", endpoint)?;
        }

        // a dry mock run never talks to S3
        if self.mock_mode && self.dry_run {
            if let Some(bucket) = &self.s3_bucket {
                validation::validate_s3_bucket_name("s3_bucket", bucket)?;
            }
        } else {
            let bucket = validation::validate_required_field("S3_BUCKET", &self.s3_bucket)?;
            validation::validate_s3_bucket_name("s3_bucket", bucket)?;
        }

        if !self.mock_mode {
            match &self.source_dir {
                Some(dir) => validation::validate_path("source_dir", &dir.to_string_lossy())?,
                None => {
                    if self.smb.server.trim().is_empty() && self.smb.mount_path.is_none() {
                        return Err(SyncError::MissingConfigError {
                            field: "SMB_SERVER".to_string(),
                        });
                    }
                }
            }
        }

        validation::validate_path("app_root", &self.app_root.to_string_lossy())?;
        Ok(())
    }
}
