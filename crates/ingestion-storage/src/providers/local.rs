//! Local filesystem storage provider.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::debug;

use ingestion_core::error::{AppError, ErrorKind};
use ingestion_core::result::AppResult;
use ingestion_core::traits::storage::{StorageProvider, StoredObject};

/// Serves objects from a directory, addressed by a download base URL.
#[derive(Debug, Clone)]
pub struct LocalStorageProvider {
    /// Root directory for all stored files.
    root: PathBuf,
    /// Base URL the root is served under.
    download_base_url: String,
}

impl LocalStorageProvider {
    pub async fn new(root_path: &str, download_base_url: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create storage root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            root,
            download_base_url: download_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key to a path within the root.
    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key.trim_start_matches('/'))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.download_base_url, key.trim_start_matches('/'))
    }

    async fn same_file(a: &Path, b: &Path) -> bool {
        match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[async_trait]
impl StorageProvider for LocalStorageProvider {
    fn provider_type(&self) -> &str {
        "fs"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.is_dir())
    }

    async fn upload_file(&self, local_path: &Path, key: &str) -> AppResult<StoredObject> {
        let target = self.resolve(key);
        if !Self::same_file(local_path, &target).await {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::copy(local_path, &target).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to copy {} to {key}", local_path.display()),
                    e,
                )
            })?;
            debug!(key, "Copied report into storage root");
        }

        let size_bytes = fs::metadata(&target).await?.len();
        Ok(StoredObject {
            key: key.to_string(),
            size_bytes,
            url: self.url_for(key),
            stored_at: Utc::now(),
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let target = self.resolve(key);
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete {key}"),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_inside_root_is_not_copied() {
        let root = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(
            root.path().to_str().unwrap(),
            "http://reports.local/download/",
        )
        .await
        .unwrap();

        let report = root.path().join("job-1").join("report.zip");
        std::fs::create_dir_all(report.parent().unwrap()).unwrap();
        std::fs::write(&report, b"zip-bytes").unwrap();

        let stored = provider.upload_file(&report, "job-1/report.zip").await.unwrap();
        assert_eq!(stored.size_bytes, 9);
        assert_eq!(stored.url, "http://reports.local/download/job-1/report.zip");
        assert!(provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_outside_file_is_copied_and_deletable() {
        let root = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(root.path().to_str().unwrap(), "http://r")
            .await
            .unwrap();

        let source = elsewhere.path().join("a.zip");
        std::fs::write(&source, b"abc").unwrap();
        provider.upload_file(&source, "job-2/a.zip").await.unwrap();
        assert!(root.path().join("job-2/a.zip").exists());

        provider.delete("job-2/a.zip").await.unwrap();
        assert!(!root.path().join("job-2/a.zip").exists());
        provider.delete("job-2/a.zip").await.unwrap();
    }
}
