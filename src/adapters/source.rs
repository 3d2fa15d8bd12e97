use crate::config::SmbConfig;
use crate::domain::model::SyncItem;
use crate::domain::ports::FileSource;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Object key for `relative` under `prefix`, always `/`-separated.
pub fn object_key(prefix: &str, relative: &Path) -> String {
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    if prefix.is_empty() {
        relative
    } else if prefix.ends_with('/') {
        format!("{}{}", prefix, relative)
    } else {
        format!("{}/{}", prefix, relative)
    }
}

/// Every regular file below `root`, hidden files included.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    prefix: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(root: &Path, prefix: &str) -> Result<Vec<SyncItem>> {
        if !root.is_dir() {
            return Err(SyncError::SourceUnavailable {
                message: format!("{} is not a directory", root.display()),
            });
        }

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .follow_links(false)
            .build();

        let mut items = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            let key = object_key(prefix, relative);

            match SyncItem::from_path(path, key) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }
}

#[async_trait]
impl FileSource for DirectorySource {
    async fn list_files(&self) -> Result<Vec<SyncItem>> {
        let root = self.root.clone();
        let prefix = self.prefix.clone();

        let items = tokio::task::spawn_blocking(move || Self::walk(&root, &prefix))
            .await
            .map_err(|e| SyncError::SourceUnavailable {
                message: format!("directory walk aborted: {}", e),
            })??;

        tracing::info!("Found {} files under {}", items.len(), self.root.display());
        Ok(items)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// An SMB share read through its mount point on this host.
#[derive(Debug, Clone)]
pub struct SmbSource {
    smb: SmbConfig,
    prefix: String,
}

impl SmbSource {
    pub fn new(smb: SmbConfig, prefix: impl Into<String>) -> Self {
        Self {
            smb,
            prefix: prefix.into(),
        }
    }

    fn mounted_directory(&self) -> Result<DirectorySource> {
        let mount = self
            .smb
            .resolved_mount_path()
            .ok_or_else(|| SyncError::MissingConfigError {
                field: "SMB_MOUNT_PATH".to_string(),
            })?;

        if !mount.is_dir() {
            return Err(SyncError::SourceUnavailable {
                message: format!(
                    "SMB share {} is not mounted at {}; \
                     mount it (e.g. mount -t cifs) or set SMB_MOUNT_PATH",
                    self.smb.unc(),
                    mount.display()
                ),
            });
        }

        Ok(DirectorySource::new(mount, self.prefix.clone()))
    }
}

#[async_trait]
impl FileSource for SmbSource {
    async fn list_files(&self) -> Result<Vec<SyncItem>> {
        let directory = self.mounted_directory()?;
        tracing::info!(
            "Listing SMB share {} via {}",
            self.smb.unc(),
            directory.root().display()
        );
        directory.list_files().await
    }

    fn describe(&self) -> String {
        format!("smb:{}", self.smb.unc())
    }
}
