//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod ingestion;
pub mod logging;
pub mod queue;
pub mod report;
pub mod services;
pub mod storage;
pub mod validation;
pub mod worker;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::ingestion::IngestionConfig;
use self::logging::LoggingConfig;
use self::queue::QueueConfig;
use self::report::ReportConfig;
use self::services::ServicesConfig;
use self::storage::StorageConfig;
use self::validation::ValidationConfig;
use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Job processor loop settings.
    #[serde(default)]
    #[validate(nested)]
    pub worker: WorkerConfig,
    /// Job/task types the worker dequeues.
    #[serde(default)]
    pub queue: QueueConfig,
    /// External service endpoints.
    pub services: ServicesConfig,
    /// Shapefile ingestion settings.
    #[serde(default)]
    #[validate(nested)]
    pub ingestion: IngestionConfig,
    /// Validation threshold settings.
    #[serde(default)]
    #[validate(nested)]
    pub validation: ValidationConfig,
    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
    /// Report storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `INGESTION__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("INGESTION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(raw: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize")
    }

    #[test]
    fn test_minimal_config_applies_defaults() {
        let config = from_toml(
            r#"
            [services]
            job_manager_url = "http://job-manager"
            job_tracker_url = "http://job-tracker"
            polygon_parts_url = "http://polygon-parts"
            "#,
        );

        assert_eq!(config.queue.task_type, "validation");
        assert_eq!(config.queue.job_types.ordered().len(), 3);
        assert_eq!(config.ingestion.max_vertices_per_chunk, 100_000);
        assert_eq!(config.worker.max_task_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_threshold_is_rejected() {
        let config = from_toml(
            r#"
            [services]
            job_manager_url = "http://job-manager"
            job_tracker_url = "http://job-tracker"
            polygon_parts_url = "http://polygon-parts"

            [validation]
            small_geometries_threshold_percentage = 150.0
            "#,
        );

        assert!(config.validate().is_err());
    }
}
