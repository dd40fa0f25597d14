//! S3-compatible object storage provider (requires the `s3` feature).

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Builder, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::{debug, info};

use ingestion_core::config::storage::S3StorageConfig;
use ingestion_core::error::{AppError, ErrorKind};
use ingestion_core::result::AppResult;
use ingestion_core::traits::storage::{StorageProvider, StoredObject};

/// S3-compatible storage provider.
#[derive(Debug, Clone)]
pub struct S3StorageProvider {
    client: Client,
    bucket: String,
    key_prefix: String,
    endpoint: String,
}

impl S3StorageProvider {
    pub fn new(config: &S3StorageConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("storage.s3.bucket must be set"));
        }
        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 storage provider"
        );

        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "ingestion-config",
        );
        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(config.endpoint.clone());
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            key_prefix: config.key_prefix.trim_matches('/').to_string(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn full_key(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.key_prefix)
        }
    }

    fn url_for(&self, full_key: &str) -> String {
        if self.endpoint.is_empty() {
            format!("s3://{}/{full_key}", self.bucket)
        } else {
            format!("{}/{}/{full_key}", self.endpoint, self.bucket)
        }
    }
}

fn s3_error(message: String, err: impl std::error::Error + Send + Sync + 'static) -> AppError {
    AppError::with_source(ErrorKind::Storage, message, err)
}

#[async_trait]
impl StorageProvider for S3StorageProvider {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok())
    }

    async fn upload_file(&self, local_path: &Path, key: &str) -> AppResult<StoredObject> {
        let full_key = self.full_key(key);
        let size_bytes = tokio::fs::metadata(local_path).await?.len();
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            s3_error(format!("Failed to open {}", local_path.display()), e)
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .content_type("application/zip")
            .body(body)
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to upload {full_key}"), e))?;

        debug!(bucket = %self.bucket, key = %full_key, size_bytes, "Uploaded object");
        Ok(StoredObject {
            url: self.url_for(&full_key),
            key: full_key,
            size_bytes,
            stored_at: Utc::now(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_key = self.full_key(key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| s3_error(format!("Failed to delete {full_key}"), e))?;
        Ok(())
    }
}
