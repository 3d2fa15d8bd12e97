use crate::config::SyncConfig;
use crate::utils::error::{Result, SyncError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional config file; every section and field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub aws: Option<AwsSection>,
    pub smb: Option<SmbSection>,
    pub sync: Option<SyncSection>,
    pub mock: Option<MockSection>,
    pub paths: Option<PathsSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsSection {
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub storage_class: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmbSection {
    pub server: Option<String>,
    pub share: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub mount_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSection {
    pub max_workers: Option<usize>,
    pub dry_run: Option<bool>,
    pub log_level: Option<String>,
    pub use_cache: Option<bool>,
    pub source_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockSection {
    pub enabled: Option<bool>,
    pub num_files: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsSection {
    pub app_root: Option<PathBuf>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${S3_BUCKET})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Overlays every value present in the file onto `config`.
    pub fn apply_to(&self, config: &mut SyncConfig) {
        if let Some(aws) = &self.aws {
            set(&mut config.aws_region, &aws.region);
            if aws.bucket.is_some() {
                config.s3_bucket = aws.bucket.clone();
            }
            set(&mut config.s3_prefix, &aws.prefix);
            set(&mut config.s3_storage_class, &aws.storage_class);
            if aws.endpoint_url.is_some() {
                config.s3_endpoint_url = aws.endpoint_url.clone();
            }
        }

        if let Some(smb) = &self.smb {
            set(&mut config.smb.server, &smb.server);
            set(&mut config.smb.share, &smb.share);
            set(&mut config.smb.user, &smb.user);
            set(&mut config.smb.password, &smb.password);
            set(&mut config.smb.domain, &smb.domain);
            if smb.mount_path.is_some() {
                config.smb.mount_path = smb.mount_path.clone();
            }
        }

        if let Some(sync) = &self.sync {
            set(&mut config.max_workers, &sync.max_workers);
            set(&mut config.dry_run, &sync.dry_run);
            set(&mut config.log_level, &sync.log_level);
            set(&mut config.use_cache, &sync.use_cache);
            if sync.source_dir.is_some() {
                config.source_dir = sync.source_dir.clone();
            }
        }

        if let Some(mock) = &self.mock {
            set(&mut config.mock_mode, &mock.enabled);
            set(&mut config.mock_num_files, &mock.num_files);
        }

        if let Some(paths) = &self.paths {
            set(&mut config.app_root, &paths.app_root);
        }
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[aws]
region = "eu-west-1"
bucket = "nightly-archive"
prefix = "exports/"
storage_class = "STANDARD_IA"

[smb]
server = "fs01"
share = "exports"
user = "svc_sync"
domain = "CORP"

[sync]
max_workers = 16
dry_run = false

[mock]
num_files = 25
"#;

        let file = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut config = SyncConfig::default();
        file.apply_to(&mut config);

        assert_eq!(config.aws_region, "eu-west-1");
        assert_eq!(config.s3_bucket.as_deref(), Some("nightly-archive"));
        assert_eq!(config.s3_prefix, "exports/");
        assert_eq!(config.s3_storage_class, "STANDARD_IA");
        assert_eq!(config.smb.server, "fs01");
        assert_eq!(config.smb.domain, "CORP");
        assert_eq!(config.max_workers, 16);
        assert!(!config.dry_run);
        assert_eq!(config.mock_num_files, 25);
        // untouched values keep their defaults
        assert!(!config.mock_mode);
        assert!(config.use_cache);
    }

    #[test]
    fn test_empty_file_changes_nothing() {
        let file = TomlConfig::from_toml_str("").unwrap();
        let mut config = SyncConfig::default();
        file.apply_to(&mut config);
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SMB_S3_SYNC_TEST_PASSWORD", "s3cret");

        let toml_content = r#"
[smb]
password = "${SMB_S3_SYNC_TEST_PASSWORD}"
user = "${SMB_S3_SYNC_TEST_UNSET_VAR}"
"#;

        let file = TomlConfig::from_toml_str(toml_content).unwrap();
        let smb = file.smb.unwrap();
        assert_eq!(smb.password.as_deref(), Some("s3cret"));
        assert_eq!(smb.user.as_deref(), Some("${SMB_S3_SYNC_TEST_UNSET_VAR}"));

        std::env::remove_var("SMB_S3_SYNC_TEST_PASSWORD");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = TomlConfig::from_toml_str("[sync]\nmax_workers = \"many\"").unwrap_err();
        assert!(matches!(err, SyncError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[mock]\nenabled = true\n\n[paths]\napp_root = \"/app\"\n")
            .unwrap();

        let file = TomlConfig::from_file(temp_file.path()).unwrap();
        let mut config = SyncConfig::default();
        file.apply_to(&mut config);
        assert!(config.mock_mode);
        assert_eq!(config.app_root, PathBuf::from("/app"));
    }
}
