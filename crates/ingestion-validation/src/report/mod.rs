//! Incremental validation report.
//!
//! Flagged features are appended chunk by chunk to a layer under
//! `<reports_root>/<job_id>/`. [`ReportBuilder::finalize`] then either
//! discards the layer or packs it, together with a metadata side-file,
//! into a single zip archive.

pub mod archive;
pub mod layer;
pub mod metadata;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use ingestion_core::config::validation::ValidationConfig;
use ingestion_core::error::{AppError, ErrorKind};
use ingestion_core::result::AppResult;
use ingestion_entity::feature::Feature;
use ingestion_entity::job::Job;
use ingestion_entity::report::Report;
use thiserror::Error;
use tracing::{debug, info};

use self::layer::{GeoJsonSeqWriter, LayerWriter};
use self::metadata::{MetadataContext, build_metadata_xml};
use crate::aggregator::ErrorSummary;

/// Base name of the flagged-features layer.
pub const LAYER_NAME: &str = "validation_errors";
/// Extension of the metadata side-file.
pub const METADATA_EXTENSION: &str = "xml";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Feature serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        let kind = match &err {
            ReportError::Io(_) | ReportError::Zip(_) => ErrorKind::Storage,
            ReportError::Serialize(_) => ErrorKind::Serialization,
            ReportError::Join(_) => ErrorKind::Internal,
        };
        let message = format!("Report error: {err}");
        AppError::with_source(kind, message, err)
    }
}

/// Inputs of [`ReportBuilder::finalize`].
pub struct FinalizeParams<'a> {
    pub job: &'a Job,
    pub task_id: &'a str,
    pub error_summary: &'a ErrorSummary,
    pub has_critical_errors: bool,
}

pub struct ReportBuilder {
    reports_root: PathBuf,
    writer: Arc<dyn LayerWriter>,
    thresholds: ValidationConfig,
}

impl ReportBuilder {
    /// Builder writing newline-delimited GeoJSON layers.
    pub fn new(reports_root: impl Into<PathBuf>, thresholds: ValidationConfig) -> Self {
        Self::with_writer(reports_root, thresholds, Arc::new(GeoJsonSeqWriter))
    }

    pub fn with_writer(
        reports_root: impl Into<PathBuf>,
        thresholds: ValidationConfig,
        writer: Arc<dyn LayerWriter>,
    ) -> Self {
        Self {
            reports_root: reports_root.into(),
            writer,
            thresholds,
        }
    }

    /// Directory holding the report of one job.
    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.reports_root.join(job_id)
    }

    fn geometry_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{LAYER_NAME}.{}", self.writer.geometry_extension()))
    }

    /// Remove anything left over from an earlier run of the job.
    pub async fn reset(&self, job_id: &str) -> AppResult<()> {
        let dir = self.job_dir(job_id);
        if tokio::fs::try_exists(&dir).await? {
            tokio::fs::remove_dir_all(&dir).await?;
            debug!(job_id, dir = %dir.display(), "Removed stale report directory");
        }
        Ok(())
    }

    /// Append a chunk's flagged features, creating the layer on first use.
    pub async fn write_chunk(&self, features: &[Feature], job_id: &str, chunk_id: u32) -> AppResult<()> {
        if features.is_empty() {
            return Ok(());
        }
        let dir = self.job_dir(job_id);
        tokio::fs::create_dir_all(&dir).await?;
        let append = tokio::fs::try_exists(self.geometry_path(&dir)).await?;

        self.writer
            .write_features(&dir, LAYER_NAME, features, append)
            .await?;
        debug!(job_id, chunk_id, features = features.len(), append, "Report chunk written");
        Ok(())
    }

    /// Turn the written layer into a report archive, or discard it.
    ///
    /// Returns `None` when nothing was written or when the findings are
    /// not critical.
    pub async fn finalize(&self, params: FinalizeParams<'_>) -> AppResult<Option<Report>> {
        let job = params.job;
        let dir = self.job_dir(&job.id);

        if !tokio::fs::try_exists(self.geometry_path(&dir)).await? {
            debug!(job_id = %job.id, "No report layer written");
            return Ok(None);
        }

        if !params.has_critical_errors {
            tokio::fs::remove_dir_all(&dir).await?;
            info!(job_id = %job.id, "No critical errors, report discarded");
            return Ok(None);
        }

        let created_at = Utc::now();
        let xml = build_metadata_xml(&MetadataContext {
            job,
            task_id: params.task_id,
            summary: params.error_summary,
            thresholds: &self.thresholds,
            created_at,
        });
        let metadata_path = dir.join(format!("{LAYER_NAME}.{METADATA_EXTENSION}"));
        tokio::fs::write(&metadata_path, xml).await?;

        let mut components = Vec::new();
        for extension in self.writer.component_extensions() {
            let path = dir.join(format!("{LAYER_NAME}.{extension}"));
            if tokio::fs::try_exists(&path).await? {
                components.push(path);
            }
        }
        components.push(metadata_path);

        let file_name = archive_file_name(job, created_at);
        let archive_path = dir.join(&file_name);
        let file_size = archive::zip_files(components.clone(), archive_path.clone()).await?;

        for component in &components {
            tokio::fs::remove_file(component).await?;
        }

        info!(
            job_id = %job.id,
            task_id = %params.task_id,
            archive = %archive_path.display(),
            size_bytes = file_size,
            "Validation report finalized"
        );
        Ok(Some(Report {
            path: archive_path.display().to_string(),
            file_name,
            file_size,
            url: None,
        }))
    }
}

/// `<productId>_<productType>_v<version>_report_<timestamp>.zip`.
pub fn archive_file_name(job: &Job, at: chrono::DateTime<Utc>) -> String {
    let timestamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!(
        "{}_v{}_report_{timestamp}.zip",
        job.entity_name(),
        job.version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use geo::{LineString, Polygon};
    use ingestion_entity::feature::Geometry;
    use ingestion_entity::job::IngestionJobParameters;
    use ingestion_entity::validation::ErrorCategory;
    use serde_json::{Map, json};
    use std::io::Read;

    fn job() -> Job {
        Job {
            id: "job-42".into(),
            job_type: "Ingestion_Update".into(),
            resource_id: "blue_marble".into(),
            version: "2.0".into(),
            product_type: "Orthophoto".into(),
            parameters: IngestionJobParameters {
                shapefile_path: "blue_marble/parts".into(),
                ingestion_resolution: 0.0001,
                ..IngestionJobParameters::default()
            },
        }
    }

    fn flagged(id: &str) -> Feature {
        let mut props = Map::new();
        props.insert("id".into(), json!(id));
        props.insert("e_res".into(), json!("Resolution conflicts with existing parts"));
        let ring = LineString::from(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        Feature::new(Some(Geometry::Polygon(Polygon::new(ring, vec![]))), props)
    }

    fn summary() -> ErrorSummary {
        let mut summary = ErrorSummary::default();
        summary.errors_count.resolution = 2;
        summary
    }

    fn builder(root: &Path) -> ReportBuilder {
        ReportBuilder::new(root, ValidationConfig::default())
    }

    #[test]
    fn test_archive_file_name() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 15).unwrap();
        assert_eq!(
            archive_file_name(&job(), at),
            "blue_marble_Orthophoto_v2.0_report_2024-05-01T10-30-15-000Z.zip"
        );
    }

    #[tokio::test]
    async fn test_write_chunk_creates_then_appends() {
        let root = tempfile::tempdir().unwrap();
        let builder = builder(root.path());

        builder.write_chunk(&[flagged("a")], "job-42", 0).await.unwrap();
        builder.write_chunk(&[], "job-42", 1).await.unwrap();
        builder.write_chunk(&[flagged("b")], "job-42", 2).await.unwrap();

        let dir = builder.job_dir("job-42");
        let content = std::fs::read_to_string(dir.join("validation_errors.geojsonl")).unwrap();
        let ids: Vec<String> = content
            .lines()
            .map(|line| serde_json::from_str::<Feature>(line).unwrap())
            .filter_map(|f| f.property_id())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(dir.join("validation_errors.prj").exists());
    }

    #[tokio::test]
    async fn test_finalize_without_layer_returns_none() {
        let root = tempfile::tempdir().unwrap();
        let builder = builder(root.path());
        let job = job();

        let report = builder
            .finalize(FinalizeParams {
                job: &job,
                task_id: "task-1",
                error_summary: &summary(),
                has_critical_errors: true,
            })
            .await
            .unwrap();
        assert!(report.is_none());
        assert!(!builder.job_dir("job-42").join("validation_errors.xml").exists());
    }

    #[tokio::test]
    async fn test_finalize_non_critical_discards_layer() {
        let root = tempfile::tempdir().unwrap();
        let builder = builder(root.path());
        let job = job();
        builder.write_chunk(&[flagged("a")], &job.id, 0).await.unwrap();

        let report = builder
            .finalize(FinalizeParams {
                job: &job,
                task_id: "task-1",
                error_summary: &summary(),
                has_critical_errors: false,
            })
            .await
            .unwrap();
        assert!(report.is_none());
        assert!(!builder.job_dir(&job.id).exists());
    }

    #[tokio::test]
    async fn test_finalize_critical_produces_archive() {
        let root = tempfile::tempdir().unwrap();
        let builder = builder(root.path());
        let job = job();
        builder.write_chunk(&[flagged("a"), flagged("b")], &job.id, 0).await.unwrap();

        let report = builder
            .finalize(FinalizeParams {
                job: &job,
                task_id: "task-1",
                error_summary: &summary(),
                has_critical_errors: true,
            })
            .await
            .unwrap()
            .expect("report");

        assert!(report.file_name.starts_with("blue_marble_Orthophoto_v2.0_report_"));
        assert!(report.file_name.ends_with(".zip"));
        assert!(report.file_size > 0);

        let dir = builder.job_dir(&job.id);
        assert!(!dir.join("validation_errors.geojsonl").exists());
        assert!(!dir.join("validation_errors.xml").exists());

        let file = std::fs::File::open(&report.path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "validation_errors.geojsonl",
                "validation_errors.prj",
                "validation_errors.xml"
            ]
        );

        let mut xml = String::new();
        archive
            .by_name("validation_errors.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        for category in ErrorCategory::ALL {
            assert!(xml.contains(category.label()));
        }
        assert!(xml.contains(metadata::SMALL_GEOMETRIES_THRESHOLD_LABEL));
        assert!(xml.contains(metadata::SMALL_HOLES_THRESHOLD_LABEL));
    }

    #[tokio::test]
    async fn test_reset_removes_previous_run() {
        let root = tempfile::tempdir().unwrap();
        let builder = builder(root.path());
        builder.write_chunk(&[flagged("a")], "job-42", 0).await.unwrap();

        builder.reset("job-42").await.unwrap();
        assert!(!builder.job_dir("job-42").exists());
        builder.reset("job-42").await.unwrap();
    }
}
