//! Storage provider trait for publishing finished report artifacts.

use std::path::Path;

use async_trait::async_trait;

use crate::result::AppResult;

/// Metadata about a published object.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredObject {
    /// Key (relative path) within the storage provider.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// URL the object can be downloaded from.
    pub url: String,
    /// When the object was stored.
    pub stored_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for report storage backends.
///
/// Implementations exist for the local filesystem and S3. The trait is
/// defined here in `ingestion-core` and implemented in `ingestion-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "fs", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Publish a local file under the given key.
    async fn upload_file(&self, local_path: &Path, key: &str) -> AppResult<StoredObject>;

    /// Delete a previously published object.
    async fn delete(&self, key: &str) -> AppResult<()>;
}
