//! Shapefile ingestion validation handler.
//!
//! Validates the shapefile of a new, update or swap-update ingestion job:
//!
//! 1. Check that every required sibling file exists.
//! 2. Count features and vertices; an empty shapefile is rejected.
//! 3. Read the file in vertex-budgeted chunks, resuming from the task's
//!    checkpoint. Each chunk is mapped, sent to the validation service and
//!    its flagged features are appended to the report.
//! 4. Finalize the report. It is kept only when the findings are critical,
//!    then published and stored on the task.

mod checkpoint;
mod chunk;

pub use checkpoint::TaskCheckpointer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use ingestion_client::PartsValidationService;
use ingestion_core::config::ingestion::IngestionConfig;
use ingestion_core::config::validation::ValidationConfig;
use ingestion_entity::job::{Job, JobKind};
use ingestion_entity::task::{Task, TaskParameters};
use ingestion_shapefile::{ChunkedReader, FeatureSource, MetricsSink, ReaderOptions, ShapefileSource};
use ingestion_storage::ReportPublisher;
use ingestion_validation::{ErrorAggregator, FinalizeParams, MappingContext, ReportBuilder};

use self::chunk::ChunkValidator;
use crate::executor::{JobExecutionError, JobHandler, JobOutcome, UnrecoverableTaskError};
use crate::queue::JobQueue;

pub struct IngestionJobHandler {
    queue: Arc<JobQueue>,
    validation: Arc<dyn PartsValidationService>,
    report_builder: Arc<ReportBuilder>,
    source: Arc<dyn FeatureSource>,
    publisher: Option<ReportPublisher>,
    metrics: Option<Arc<dyn MetricsSink>>,
    sources_root: PathBuf,
    max_vertices_per_chunk: u64,
    required_extensions: Vec<String>,
    thresholds: ValidationConfig,
}

impl IngestionJobHandler {
    pub fn new(
        queue: Arc<JobQueue>,
        validation: Arc<dyn PartsValidationService>,
        report_builder: Arc<ReportBuilder>,
        ingestion: &IngestionConfig,
        thresholds: ValidationConfig,
    ) -> Self {
        Self {
            queue,
            validation,
            report_builder,
            source: Arc::new(ShapefileSource),
            publisher: None,
            metrics: None,
            sources_root: PathBuf::from(&ingestion.sources_root),
            max_vertices_per_chunk: ingestion.max_vertices_per_chunk,
            required_extensions: ingestion.required_extensions.clone(),
            thresholds,
        }
    }

    /// Replace the shapefile decoder.
    pub fn with_source(mut self, source: Arc<dyn FeatureSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_publisher(mut self, publisher: ReportPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn resolve(&self, shapefile_path: &str) -> PathBuf {
        self.sources_root.join(shapefile_path)
    }

    /// Names of the required sibling files that do not exist.
    async fn missing_files(&self, shapefile: &Path) -> Vec<String> {
        let mut missing = Vec::new();
        for extension in &self.required_extensions {
            let path = shapefile.with_extension(extension);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                missing.push(
                    path.file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string()),
                );
            }
        }
        missing
    }

    /// Task parameters to resume from, and whether they continue a previous
    /// run over `shapefile`. A checkpoint taken on another file is dropped
    /// together with its counts.
    fn resume_parameters(task: &Task, shapefile: &Path) -> (TaskParameters, bool) {
        let mut parameters = task.parameters.clone();
        let file_path = shapefile.display().to_string();
        let resume = match &parameters.processing_state {
            Some(state) if state.file_path == file_path => true,
            Some(state) => {
                warn!(
                    checkpoint_file = %state.file_path,
                    shapefile = %file_path,
                    "Checkpoint belongs to another file, starting over"
                );
                false
            }
            None => false,
        };
        if !resume {
            parameters.processing_state = None;
            parameters.aggregated_counts = None;
        }
        (parameters, resume)
    }

    fn reader(&self, checkpointer: Arc<TaskCheckpointer>) -> ChunkedReader {
        let mut options =
            ReaderOptions::new(self.max_vertices_per_chunk).with_checkpointer(checkpointer);
        if let Some(metrics) = &self.metrics {
            options = options.with_metrics(Arc::clone(metrics));
        }
        ChunkedReader::new(Arc::clone(&self.source), options)
    }
}

#[async_trait]
impl JobHandler for IngestionJobHandler {
    fn job_kinds(&self) -> &[JobKind] {
        &JobKind::ALL
    }

    #[instrument(skip_all, fields(job_id = %job.id, task_id = %task.id))]
    async fn process_job(&self, job: &Job, task: &Task) -> Result<JobOutcome, JobExecutionError> {
        let shapefile = self.resolve(&job.parameters.shapefile_path);

        let missing = self.missing_files(&shapefile).await;
        if !missing.is_empty() {
            return Err(UnrecoverableTaskError::ShapefileNotFound {
                path: shapefile.display().to_string(),
                missing,
            }
            .into());
        }

        let (parameters, resume) = Self::resume_parameters(task, &shapefile);
        let restored_counts = parameters.aggregated_counts;
        let checkpointer = Arc::new(TaskCheckpointer::new(
            Arc::clone(&self.queue),
            &job.id,
            &task.id,
            parameters,
        ));
        let reader = self.reader(Arc::clone(&checkpointer));

        let stats = reader.stats(&shapefile).await?;
        if stats.is_empty() {
            return Err(UnrecoverableTaskError::EmptyShapefile {
                path: shapefile.display().to_string(),
            }
            .into());
        }
        info!(
            shapefile = %shapefile.display(),
            total_features = stats.total_features,
            total_vertices = stats.total_vertices,
            "Validating shapefile"
        );

        let mut aggregator = ErrorAggregator::new(self.thresholds);
        aggregator.set_shapefile_stats(stats);

        if !resume {
            self.report_builder.reset(&job.id).await?;
        } else if let Some(counts) = restored_counts {
            aggregator.restore_counts(counts);
        }

        let mut validator = ChunkValidator {
            job,
            validation: self.validation.as_ref(),
            aggregator: &mut aggregator,
            report_builder: &self.report_builder,
            checkpointer: &checkpointer,
            mapping: MappingContext {
                resolution_degree: job.parameters.ingestion_resolution,
            },
            max_vertices_per_chunk: self.max_vertices_per_chunk,
        };
        let summary = reader
            .read_and_process(&shapefile, &stats, &mut validator)
            .await?;

        let error_summary = aggregator.summary();
        let has_critical_errors = aggregator.has_critical_errors();
        info!(
            chunks = summary.chunks_processed,
            resumed_from_chunk = ?summary.resumed_from_chunk,
            total_errors = error_summary.errors_count.total(),
            has_critical_errors,
            duration_ms = summary.duration.as_millis() as u64,
            "Shapefile processed"
        );

        let report = self
            .report_builder
            .finalize(FinalizeParams {
                job,
                task_id: &task.id,
                error_summary: &error_summary,
                has_critical_errors,
            })
            .await?;

        let report = match (report, &self.publisher) {
            (Some(report), Some(publisher)) => Some(publisher.publish(&job.id, report).await?),
            (report, _) => report,
        };

        if let Some(report) = &report {
            checkpointer.save_report(report.clone()).await?;
        }

        Ok(JobOutcome { report })
    }
}
