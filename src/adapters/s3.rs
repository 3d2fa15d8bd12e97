use crate::config::SyncConfig;
use crate::domain::model::SyncItem;
use crate::domain::ports::ObjectStore;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, StorageClass};
use aws_sdk_s3::Client as S3Client;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::task::{JoinError, JoinSet};

const MIB: u64 = 1024 * 1024;

/// S3 rejects multipart uploads with more parts than this.
pub const MAX_PARTS: u64 = 10_000;

/// Multipart and retry tuning, mirroring the AWS CLI transfer defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub multipart_threshold: u64,
    pub part_size: u64,
    pub part_concurrency: usize,
    pub max_attempts: u32,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            multipart_threshold: 8 * MIB,
            part_size: 8 * MIB,
            part_concurrency: 10,
            max_attempts: 5,
        }
    }
}

impl TransferSettings {
    /// Part size for a `size` byte file, grown when needed to stay within `MAX_PARTS`.
    pub fn part_size_for(&self, size: u64) -> u64 {
        self.part_size.max(size.div_ceil(MAX_PARTS)).max(1)
    }

    /// `(part_number, offset, length)` for every part of a `size` byte file.
    pub fn parts(&self, size: u64) -> Vec<(i32, u64, u64)> {
        let part_size = self.part_size_for(size);
        let mut parts = Vec::new();
        let mut offset = 0;
        let mut number = 1;
        while offset < size {
            let len = part_size.min(size - offset);
            parts.push((number, offset, len));
            offset += len;
            number += 1;
        }
        parts
    }
}

#[derive(Debug, Clone)]
pub struct S3Store {
    client: S3Client,
    bucket: String,
    storage_class: StorageClass,
    settings: TransferSettings,
}

impl S3Store {
    pub fn new(
        client: S3Client,
        bucket: impl Into<String>,
        storage_class: &str,
        settings: TransferSettings,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            storage_class: StorageClass::from(storage_class),
            settings,
        }
    }

    /// Builds a client from the default AWS credential chain and `config`.
    pub async fn connect(config: &SyncConfig) -> Self {
        let settings = TransferSettings::default();
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.s3_endpoint_url {
            tracing::info!("Using custom S3 endpoint {}", endpoint);
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(
            S3Client::from_conf(builder.build()),
            config.bucket(),
            &config.s3_storage_class,
            settings,
        )
    }

    fn upload_error(key: &str, message: impl Into<String>) -> SyncError {
        SyncError::UploadError {
            key: key.to_string(),
            message: message.into(),
        }
    }

    async fn put_single(&self, item: &SyncItem) -> Result<u64> {
        let body = ByteStream::from_path(&item.local_path)
            .await
            .map_err(|e| Self::upload_error(&item.key, e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&item.key)
            .storage_class(self.storage_class.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| Self::upload_error(&item.key, DisplayErrorContext(&e).to_string()))?;

        Ok(item.size)
    }

    async fn put_multipart(&self, item: &SyncItem) -> Result<u64> {
        let created = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(&item.key)
            .storage_class(self.storage_class.clone())
            .send()
            .await
            .map_err(|e| Self::upload_error(&item.key, DisplayErrorContext(&e).to_string()))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| Self::upload_error(&item.key, "no upload id in response"))?
            .to_string();

        tracing::debug!(
            "Multipart upload {} for {} ({} bytes)",
            upload_id,
            item.key,
            item.size
        );

        match self.upload_parts(item, &upload_id).await {
            Ok(parts) => {
                let completed = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();
                let result = self
                    .client
                    .complete_multipart_upload()
                    .bucket(&self.bucket)
                    .key(&item.key)
                    .upload_id(&upload_id)
                    .multipart_upload(completed)
                    .send()
                    .await;
                match result {
                    Ok(_) => Ok(item.size),
                    Err(e) => {
                        let message = DisplayErrorContext(&e).to_string();
                        self.abort(&item.key, &upload_id).await;
                        Err(Self::upload_error(&item.key, message))
                    }
                }
            }
            Err(e) => {
                self.abort(&item.key, &upload_id).await;
                Err(e)
            }
        }
    }

    /// Uploads parts with at most `part_concurrency` in flight and stops queueing new
    /// parts as soon as one fails.
    async fn upload_parts(&self, item: &SyncItem, upload_id: &str) -> Result<Vec<CompletedPart>> {
        let concurrency = self.settings.part_concurrency.max(1);
        let mut tasks = JoinSet::new();
        let mut parts = Vec::new();

        for (part_number, offset, len) in self.settings.parts(item.size) {
            while let Some(joined) = tasks.try_join_next() {
                Self::collect_part(&mut tasks, &mut parts, &item.key, joined)?;
            }
            while tasks.len() >= concurrency {
                if let Some(joined) = tasks.join_next().await {
                    Self::collect_part(&mut tasks, &mut parts, &item.key, joined)?;
                }
            }

            let client = self.client.clone();
            let bucket = self.bucket.clone();
            let key = item.key.clone();
            let upload_id = upload_id.to_string();
            let path = item.local_path.clone();
            tasks.spawn(async move {
                upload_part(client, bucket, key, upload_id, path, part_number, offset, len).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            Self::collect_part(&mut tasks, &mut parts, &item.key, joined)?;
        }

        parts.sort_by_key(|p| p.part_number());
        Ok(parts)
    }

    fn collect_part(
        tasks: &mut JoinSet<Result<CompletedPart>>,
        parts: &mut Vec<CompletedPart>,
        key: &str,
        joined: std::result::Result<Result<CompletedPart>, JoinError>,
    ) -> Result<()> {
        match joined {
            Ok(Ok(part)) => {
                parts.push(part);
                Ok(())
            }
            Ok(Err(e)) => {
                tasks.abort_all();
                Err(e)
            }
            Err(e) => {
                tasks.abort_all();
                Err(Self::upload_error(key, format!("part task failed: {}", e)))
            }
        }
    }

    async fn abort(&self, key: &str, upload_id: &str) {
        let result = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(
                "Failed to abort multipart upload {} for {}: {}",
                upload_id,
                key,
                DisplayErrorContext(&e)
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn upload_part(
    client: S3Client,
    bucket: String,
    key: String,
    upload_id: String,
    path: PathBuf,
    part_number: i32,
    offset: u64,
    len: u64,
) -> Result<CompletedPart> {
    let mut file = tokio::fs::File::open(&path).await?;
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    let mut buf = vec![0u8; len as usize];
    file.read_exact(&mut buf).await?;

    let output = client
        .upload_part()
        .bucket(&bucket)
        .key(&key)
        .upload_id(&upload_id)
        .part_number(part_number)
        .body(ByteStream::from(buf))
        .send()
        .await
        .map_err(|e| SyncError::UploadError {
            key: key.clone(),
            message: format!("part {}: {}", part_number, DisplayErrorContext(&e)),
        })?;

    Ok(CompletedPart::builder()
        .part_number(part_number)
        .set_e_tag(output.e_tag().map(str::to_string))
        .build())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, item: &SyncItem) -> Result<u64> {
        if item.size >= self.settings.multipart_threshold {
            self.put_multipart(item).await
        } else {
            self.put_single(item).await
        }
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}
