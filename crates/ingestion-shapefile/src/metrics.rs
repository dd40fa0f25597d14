//! Reader metrics and telemetry.
//!
//! Per-chunk and per-file timings are pushed to a [`MetricsSink`].
//! [`ReaderMetrics`] is the default sink: it logs every record through
//! `tracing` and keeps atomic counters plus a bounded window of chunk
//! durations for percentile snapshots.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Timing of one processed chunk.
#[derive(Debug, Clone)]
pub struct ChunkMetrics {
    pub chunk_id: u32,
    pub features: u64,
    pub skipped_features: u64,
    pub vertices: u64,
    pub duration: Duration,
}

/// Timing of a whole file pass.
#[derive(Debug, Clone)]
pub struct FileMetrics {
    pub file_path: String,
    pub chunks: u32,
    pub features: u64,
    pub vertices: u64,
    pub duration: Duration,
}

impl FileMetrics {
    /// Features per second over the pass.
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.features as f64 / secs
        }
    }
}

/// Receives reader metrics.
pub trait MetricsSink: Send + Sync {
    fn on_chunk_processed(&self, metrics: &ChunkMetrics);

    fn on_file_processed(&self, metrics: &FileMetrics);
}

/// Maximum number of chunk duration samples to keep in memory.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Counter-based metrics collector.
#[derive(Debug)]
pub struct ReaderMetrics {
    pub chunks_processed: AtomicU64,
    pub features_processed: AtomicU64,
    pub features_skipped: AtomicU64,
    pub vertices_processed: AtomicU64,
    pub files_processed: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

impl ReaderMetrics {
    pub fn new() -> Self {
        Self {
            chunks_processed: AtomicU64::new(0),
            features_processed: AtomicU64::new(0),
            features_skipped: AtomicU64::new(0),
            vertices_processed: AtomicU64::new(0),
            files_processed: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();
        let (p50, p95, p99) = percentiles(&durations);

        MetricsSnapshot {
            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            features_processed: self.features_processed.load(Ordering::Relaxed),
            features_skipped: self.features_skipped.load(Ordering::Relaxed),
            vertices_processed: self.vertices_processed.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            chunk_p50_ms: p50.map(|d| d.as_millis() as u64),
            chunk_p95_ms: p95.map(|d| d.as_millis() as u64),
            chunk_p99_ms: p99.map(|d| d.as_millis() as u64),
            sample_count: durations.len() as u64,
        }
    }
}

impl Default for ReaderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for ReaderMetrics {
    fn on_chunk_processed(&self, metrics: &ChunkMetrics) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
        self.features_processed
            .fetch_add(metrics.features, Ordering::Relaxed);
        self.features_skipped
            .fetch_add(metrics.skipped_features, Ordering::Relaxed);
        self.vertices_processed
            .fetch_add(metrics.vertices, Ordering::Relaxed);
        self.add_duration_sample(metrics.duration);

        debug!(
            chunk_id = metrics.chunk_id,
            features = metrics.features,
            skipped = metrics.skipped_features,
            vertices = metrics.vertices,
            duration_ms = metrics.duration.as_millis() as u64,
            "Chunk processed"
        );
    }

    fn on_file_processed(&self, metrics: &FileMetrics) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);

        info!(
            file = %metrics.file_path,
            chunks = metrics.chunks,
            features = metrics.features,
            vertices = metrics.vertices,
            duration_ms = metrics.duration.as_millis() as u64,
            features_per_second = metrics.throughput(),
            "File processed"
        );
    }
}

fn percentiles(durations: &[Duration]) -> (Option<Duration>, Option<Duration>, Option<Duration>) {
    if durations.is_empty() {
        return (None, None, None);
    }
    let mut sorted = durations.to_vec();
    sorted.sort();
    let len = sorted.len();
    (
        sorted.get(len * 50 / 100).copied(),
        sorted.get(len * 95 / 100).copied(),
        sorted.get(len.saturating_sub(1) * 99 / 100).copied(),
    )
}

/// Point-in-time view of [`ReaderMetrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub chunks_processed: u64,
    pub features_processed: u64,
    pub features_skipped: u64,
    pub vertices_processed: u64,
    pub files_processed: u64,
    pub chunk_p50_ms: Option<u64>,
    pub chunk_p95_ms: Option<u64>,
    pub chunk_p99_ms: Option<u64>,
    pub sample_count: u64,
}
