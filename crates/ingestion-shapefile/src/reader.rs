//! Vertex-budgeted, resumable chunk reader.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use ingestion_core::error::AppError;
use ingestion_core::result::AppResult;
use ingestion_entity::feature::Feature;
use ingestion_entity::shapefile::{ShapefileChunk, ShapefileStats};
use ingestion_entity::task::{ProcessingProgress, ProcessingState};
use tracing::{debug, info, warn};

use crate::checkpoint::Checkpointer;
use crate::metrics::{ChunkMetrics, FileMetrics, MetricsSink};
use crate::source::FeatureSource;

/// Consumes chunks in file order.
#[async_trait]
pub trait ChunkProcessor: Send {
    async fn process(&mut self, chunk: ShapefileChunk) -> AppResult<()>;
}

/// Chunked reader settings.
#[derive(Clone)]
pub struct ReaderOptions {
    /// Upper bound on the vertices of one chunk's features.
    pub max_vertices_per_chunk: u64,
    pub checkpointer: Option<Arc<dyn Checkpointer>>,
    pub metrics: Option<Arc<dyn MetricsSink>>,
}

impl ReaderOptions {
    pub fn new(max_vertices_per_chunk: u64) -> Self {
        Self {
            max_vertices_per_chunk,
            checkpointer: None,
            metrics: None,
        }
    }

    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Outcome of one [`ChunkedReader::read_and_process`] pass.
#[derive(Debug, Clone, Default)]
pub struct ReadSummary {
    /// Chunks processed during this pass.
    pub chunks_processed: u32,
    pub features_processed: u64,
    pub vertices_processed: u64,
    pub skipped_features: u64,
    /// Chunk the pass resumed at, when a checkpoint applied.
    pub resumed_from_chunk: Option<u32>,
    pub progress: ProcessingProgress,
    pub duration: Duration,
}

/// Reads a shapefile chunk by chunk.
pub struct ChunkedReader {
    source: Arc<dyn FeatureSource>,
    options: ReaderOptions,
}

impl ChunkedReader {
    pub fn new(source: Arc<dyn FeatureSource>, options: ReaderOptions) -> Self {
        Self { source, options }
    }

    /// Whole-file feature and vertex totals.
    ///
    /// Decodes the file once on the blocking pool.
    pub async fn stats(&self, path: &Path) -> AppResult<ShapefileStats> {
        let source = Arc::clone(&self.source);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> AppResult<ShapefileStats> {
            let mut stats = ShapefileStats::default();
            for feature in source.open(&path)? {
                stats.total_features += 1;
                stats.total_vertices += feature?.vertices_count();
            }
            Ok(stats)
        })
        .await
        .map_err(|e| AppError::internal(format!("Shapefile stats task failed: {e}")))?
    }

    /// Feed every remaining chunk of `path` to `processor`, checkpointing
    /// after each one.
    pub async fn read_and_process<P>(
        &self,
        path: &Path,
        stats: &ShapefileStats,
        processor: &mut P,
    ) -> AppResult<ReadSummary>
    where
        P: ChunkProcessor + ?Sized,
    {
        let started = Instant::now();
        let file_path = path.display().to_string();
        let budget = self.options.max_vertices_per_chunk;

        let resume = self.resume_point(&file_path, stats).await?;
        let mut summary = ReadSummary {
            resumed_from_chunk: resume.state.as_ref().map(|_| resume.next_chunk_id),
            progress: resume.progress,
            ..ReadSummary::default()
        };

        let mut pending = PendingChunk::new(resume.next_chunk_id);
        for (index, item) in self.source.open(path)?.enumerate() {
            let index = index as u64;
            let feature = item?;
            if index < resume.start_feature {
                continue;
            }

            let vertices = feature.vertices_count();
            if vertices > budget {
                pending.skip(feature, vertices, index);
                continue;
            }
            if pending.vertices + vertices > budget && !pending.features.is_empty() {
                let next_id = pending.id + 1;
                let full = std::mem::replace(&mut pending, PendingChunk::new(next_id));
                self.flush(full, &file_path, processor, &mut summary).await?;
            }
            pending.push(feature, vertices, index);
        }
        if !pending.is_empty() {
            self.flush(pending, &file_path, processor, &mut summary)
                .await?;
        }

        summary.duration = started.elapsed();
        if let Some(metrics) = &self.options.metrics {
            metrics.on_file_processed(&FileMetrics {
                file_path: file_path.clone(),
                chunks: summary.chunks_processed,
                features: summary.features_processed,
                vertices: summary.vertices_processed,
                duration: summary.duration,
            });
        }
        info!(
            file = %file_path,
            chunks = summary.chunks_processed,
            features = summary.features_processed,
            skipped = summary.skipped_features,
            "Shapefile fully processed"
        );
        Ok(summary)
    }

    async fn resume_point(&self, file_path: &str, stats: &ShapefileStats) -> AppResult<ResumePoint> {
        let state = match &self.options.checkpointer {
            Some(checkpointer) => checkpointer.load().await?,
            None => None,
        };

        match state {
            Some(state) if state.file_path == file_path => {
                info!(
                    file = %file_path,
                    last_chunk = state.last_processed_chunk_index,
                    last_feature = state.last_processed_feature_index,
                    "Resuming from checkpoint"
                );
                Ok(ResumePoint {
                    next_chunk_id: state.last_processed_chunk_index + 1,
                    start_feature: state.last_processed_feature_index + 1,
                    progress: state
                        .progress
                        .clone()
                        .unwrap_or_else(|| ProcessingProgress::new(stats)),
                    state: Some(state),
                })
            }
            other => {
                if let Some(stale) = other {
                    warn!(
                        expected = %file_path,
                        found = %stale.file_path,
                        "Checkpoint belongs to another file, starting over"
                    );
                }
                Ok(ResumePoint {
                    next_chunk_id: 0,
                    start_feature: 0,
                    progress: ProcessingProgress::new(stats),
                    state: None,
                })
            }
        }
    }

    async fn flush<P>(
        &self,
        pending: PendingChunk,
        file_path: &str,
        processor: &mut P,
        summary: &mut ReadSummary,
    ) -> AppResult<()>
    where
        P: ChunkProcessor + ?Sized,
    {
        let started = Instant::now();
        let last_feature_index = pending.last_index;
        let chunk = pending.into_chunk();
        let chunk_id = chunk.id;
        let span = chunk.feature_span();
        let features = chunk.features.len() as u64;
        let skipped = chunk.skipped_features.len() as u64;
        let vertices = chunk.vertices_count + chunk.skipped_vertices_count;

        debug!(chunk_id, features, skipped, vertices, "Processing chunk");
        processor.process(chunk).await?;

        summary
            .progress
            .record_chunk(span, vertices, skipped);
        summary.chunks_processed += 1;
        summary.features_processed += features;
        summary.vertices_processed += vertices;
        summary.skipped_features += skipped;

        if let Some(checkpointer) = &self.options.checkpointer {
            let state = ProcessingState {
                last_processed_chunk_index: chunk_id,
                last_processed_feature_index: last_feature_index,
                file_path: file_path.to_string(),
                timestamp: Utc::now(),
                progress: Some(summary.progress.clone()),
            };
            checkpointer.save(&state).await?;
        }

        if let Some(metrics) = &self.options.metrics {
            metrics.on_chunk_processed(&ChunkMetrics {
                chunk_id,
                features,
                skipped_features: skipped,
                vertices,
                duration: started.elapsed(),
            });
        }
        Ok(())
    }
}

struct ResumePoint {
    next_chunk_id: u32,
    start_feature: u64,
    progress: ProcessingProgress,
    state: Option<ProcessingState>,
}

/// Chunk under construction.
struct PendingChunk {
    id: u32,
    vertices: u64,
    features: Vec<Feature>,
    skipped: Vec<Feature>,
    skipped_vertices: u64,
    last_index: u64,
}

impl PendingChunk {
    fn new(id: u32) -> Self {
        Self {
            id,
            vertices: 0,
            features: Vec::new(),
            skipped: Vec::new(),
            skipped_vertices: 0,
            last_index: 0,
        }
    }

    fn push(&mut self, feature: Feature, vertices: u64, index: u64) {
        self.vertices += vertices;
        self.features.push(feature);
        self.last_index = index;
    }

    fn skip(&mut self, feature: Feature, vertices: u64, index: u64) {
        self.skipped_vertices += vertices;
        self.skipped.push(feature);
        self.last_index = index;
    }

    fn is_empty(&self) -> bool {
        self.features.is_empty() && self.skipped.is_empty()
    }

    fn into_chunk(self) -> ShapefileChunk {
        ShapefileChunk {
            id: self.id,
            vertices_count: self.vertices,
            features: self.features,
            skipped_features: self.skipped,
            skipped_vertices_count: self.skipped_vertices,
        }
    }
}
