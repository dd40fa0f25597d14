//! Checkpoint state persisted between chunks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shapefile::ShapefileStats;

/// Position of the chunk reader inside a shapefile.
///
/// Indices are inclusive: resuming starts at chunk
/// `last_processed_chunk_index + 1` and feature
/// `last_processed_feature_index + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingState {
    /// Id of the last chunk fully processed.
    pub last_processed_chunk_index: u32,
    /// Index of the last feature covered by that chunk, skipped features included.
    pub last_processed_feature_index: u64,
    /// Shapefile the state belongs to.
    pub file_path: String,
    /// When the state was saved.
    pub timestamp: DateTime<Utc>,
    /// Progress counters at the time of saving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProcessingProgress>,
}

/// Running progress counters for a shapefile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingProgress {
    pub total_features: u64,
    pub processed_features: u64,
    pub total_vertices: u64,
    pub processed_vertices: u64,
    pub processed_chunks: u32,
    pub skipped_features: u64,
    /// `processed_vertices / total_vertices * 100`.
    pub percentage: f64,
}

impl ProcessingProgress {
    /// Start counting against the whole-file totals.
    pub fn new(stats: &ShapefileStats) -> Self {
        Self {
            total_features: stats.total_features,
            total_vertices: stats.total_vertices,
            ..Self::default()
        }
    }

    /// Account for one processed chunk.
    pub fn record_chunk(&mut self, features: u64, vertices: u64, skipped: u64) {
        self.processed_chunks += 1;
        self.processed_features += features;
        self.processed_vertices += vertices;
        self.skipped_features += skipped;
        self.percentage = if self.total_vertices == 0 {
            100.0
        } else {
            self.processed_vertices as f64 / self.total_vertices as f64 * 100.0
        };
    }

    /// Percentage as persisted on the task, rounded to the nearest integer.
    pub fn rounded_percentage(&self) -> u8 {
        self.percentage.round().clamp(0.0, 100.0) as u8
    }
}
