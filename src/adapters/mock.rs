use crate::adapters::source::object_key;
use crate::domain::model::SyncItem;
use crate::domain::ports::FileSource;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub const MOCK_FILE_SIZE: usize = 100 * 1024;
pub const MAX_MOCK_DIRS: usize = 100;

/// Writes `num_files` 100 KiB files spread over `dir_NNNN` directories below `base_path`.
///
/// Uses `clamp(num_files / 10, 1, 100)` directories with an equal share each, so the
/// total can round down when `num_files` is not a multiple of the directory count.
pub fn create_mock_data(base_path: &Path, num_files: usize, prefix: &str) -> Result<Vec<SyncItem>> {
    generate(base_path, num_files, MOCK_FILE_SIZE, prefix)
}

fn generate(
    base_path: &Path,
    num_files: usize,
    file_size: usize,
    prefix: &str,
) -> Result<Vec<SyncItem>> {
    tracing::info!("Creating {} mock files...", num_files);
    std::fs::create_dir_all(base_path)?;

    if num_files == 0 {
        return Ok(Vec::new());
    }

    let num_dirs = (num_files / 10).clamp(1, MAX_MOCK_DIRS);
    let files_per_dir = num_files / num_dirs;
    let payload = vec![b'x'; file_size];

    let mut files = Vec::with_capacity(num_dirs * files_per_dir);
    for i in 0..num_dirs {
        let dir_path = base_path.join(format!("dir_{:04}", i));
        std::fs::create_dir_all(&dir_path)?;

        for j in 0..files_per_dir {
            let file_path = dir_path.join(format!("file_{:04}.txt", j));
            std::fs::write(&file_path, &payload)?;

            let relative = file_path.strip_prefix(base_path).unwrap_or(file_path.as_path());
            let key = object_key(prefix, relative);
            files.push(SyncItem::from_path(&file_path, key)?);
        }
    }

    tracing::info!("Created {} mock files in {}", files.len(), base_path.display());
    Ok(files)
}

/// Generates a fresh mock data set on every listing.
#[derive(Debug, Clone)]
pub struct MockSource {
    base_path: PathBuf,
    num_files: usize,
    prefix: String,
}

impl MockSource {
    pub fn new(base_path: impl Into<PathBuf>, num_files: usize, prefix: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            num_files,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl FileSource for MockSource {
    async fn list_files(&self) -> Result<Vec<SyncItem>> {
        let base_path = self.base_path.clone();
        let num_files = self.num_files;
        let prefix = self.prefix.clone();

        tokio::task::spawn_blocking(move || create_mock_data(&base_path, num_files, &prefix))
            .await
            .map_err(|e| SyncError::SourceUnavailable {
                message: format!("mock data generation aborted: {}", e),
            })?
    }

    fn describe(&self) -> String {
        format!("mock:{}", self.base_path.display())
    }
}
