use crate::domain::model::SyncItem;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Produces the list of files to sync.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn list_files(&self) -> Result<Vec<SyncItem>>;

    /// Short description used in logs and reports.
    fn describe(&self) -> String;
}

/// Destination for file uploads.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads one file and returns the number of bytes sent.
    async fn upload(&self, item: &SyncItem) -> Result<u64>;

    /// Printable location of `key`, e.g. `s3://bucket/key`.
    fn location(&self, key: &str) -> String;
}
