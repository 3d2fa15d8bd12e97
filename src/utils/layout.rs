use crate::utils::error::{Result, SyncError};
use std::path::{Path, PathBuf};

pub const LOGS_DIR: &str = "logs";
pub const CACHE_DIR: &str = "cache";
pub const TEST_DATA_DIR: &str = "test-data";

const WRITE_CHECK_FILE: &str = ".write-check";

/// Writable directories the container image provisions under the app root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLayout {
    pub root: PathBuf,
    pub logs: PathBuf,
    pub cache: PathBuf,
    pub test_data: PathBuf,
}

impl RuntimeLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            logs: root.join(LOGS_DIR),
            cache: root.join(CACHE_DIR),
            test_data: root.join(TEST_DATA_DIR),
            root,
        }
    }

    pub fn dirs(&self) -> [&Path; 3] {
        [self.logs.as_path(), self.cache.as_path(), self.test_data.as_path()]
    }

    /// Creates missing directories and checks that each one accepts writes.
    pub fn ensure(&self) -> Result<()> {
        for dir in self.dirs() {
            std::fs::create_dir_all(dir).map_err(|e| layout_error(dir, e))?;

            let marker = dir.join(WRITE_CHECK_FILE);
            std::fs::write(&marker, b"ok").map_err(|e| layout_error(dir, e))?;
            std::fs::remove_file(&marker).map_err(|e| layout_error(dir, e))?;

            tracing::debug!("Runtime directory ready: {}", dir.display());
        }
        Ok(())
    }

    pub fn mock_data_dir(&self) -> PathBuf {
        self.test_data.join("mock")
    }
}

fn layout_error(path: &Path, err: std::io::Error) -> SyncError {
    SyncError::LayoutError {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = RuntimeLayout::new("/app");
        assert_eq!(layout.logs, PathBuf::from("/app/logs"));
        assert_eq!(layout.cache, PathBuf::from("/app/cache"));
        assert_eq!(layout.test_data, PathBuf::from("/app/test-data"));
        assert_eq!(layout.mock_data_dir(), PathBuf::from("/app/test-data/mock"));
    }

    #[test]
    fn test_ensure_creates_writable_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let layout = RuntimeLayout::new(temp_dir.path().join("app"));

        layout.ensure().unwrap();

        for dir in layout.dirs() {
            assert!(dir.is_dir());
            assert!(!dir.join(WRITE_CHECK_FILE).exists());
        }
        // idempotent
        layout.ensure().unwrap();
    }

    #[test]
    fn test_ensure_reports_blocked_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("app");
        std::fs::create_dir_all(&root).unwrap();
        // a regular file where the logs directory should be
        std::fs::write(root.join(LOGS_DIR), b"not a dir").unwrap();

        let err = RuntimeLayout::new(&root).ensure().unwrap_err();
        match err {
            SyncError::LayoutError { path, .. } => assert!(path.ends_with(LOGS_DIR)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
