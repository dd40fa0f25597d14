//! Report publishing through the configured storage provider.

use std::path::Path;
use std::sync::Arc;

use ingestion_core::config::report::ReportConfig;
use ingestion_core::config::storage::StorageConfig;
use ingestion_core::error::AppError;
use ingestion_core::result::AppResult;
use ingestion_core::traits::storage::StorageProvider;
use ingestion_entity::report::Report;
use tracing::info;

use crate::providers::LocalStorageProvider;

/// Uploads finalized reports and fills in their download URL.
#[derive(Debug, Clone)]
pub struct ReportPublisher {
    provider: Arc<dyn StorageProvider>,
}

impl ReportPublisher {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// Build the provider named by `report.storage_provider`.
    pub async fn from_config(report: &ReportConfig, storage: &StorageConfig) -> AppResult<Self> {
        let provider: Arc<dyn StorageProvider> = match report.storage_provider.as_str() {
            "fs" => Arc::new(
                LocalStorageProvider::new(&report.reports_root, &report.download_base_url).await?,
            ),
            #[cfg(feature = "s3")]
            "s3" => Arc::new(crate::providers::S3StorageProvider::new(&storage.s3)?),
            #[cfg(not(feature = "s3"))]
            "s3" => {
                let _ = storage;
                return Err(AppError::configuration(
                    "S3 report storage requires the `s3` feature",
                ));
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown report storage provider: {other}"
                )));
            }
        };
        Ok(Self::new(provider))
    }

    pub fn provider_type(&self) -> &str {
        self.provider.provider_type()
    }

    /// Store the report under `<job_id>/<file_name>`.
    pub async fn publish(&self, job_id: &str, report: Report) -> AppResult<Report> {
        let key = format!("{job_id}/{}", report.file_name);
        let stored = self
            .provider
            .upload_file(Path::new(&report.path), &key)
            .await?;
        info!(
            job_id,
            provider = self.provider.provider_type(),
            key = %stored.key,
            "Report published"
        );
        Ok(Report {
            url: Some(stored.url),
            ..report
        })
    }
}
