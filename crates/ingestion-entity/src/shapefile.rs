//! Chunking models for shapefile reading.

use serde::{Deserialize, Serialize};

use crate::feature::Feature;

/// A bounded batch of features yielded by the chunked reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapefileChunk {
    /// Sequential chunk id, starting at zero.
    pub id: u32,
    /// Vertices of `features`; never above the configured budget.
    pub vertices_count: u64,
    pub features: Vec<Feature>,
    /// Features whose own vertex count exceeds the budget.
    pub skipped_features: Vec<Feature>,
    pub skipped_vertices_count: u64,
}

impl ShapefileChunk {
    /// Number of features covered by the chunk, skipped ones included.
    pub fn feature_span(&self) -> u64 {
        (self.features.len() + self.skipped_features.len()) as u64
    }
}

/// Whole-file totals captured once before processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapefileStats {
    pub total_features: u64,
    pub total_vertices: u64,
}

impl ShapefileStats {
    /// True when the file holds nothing to validate.
    pub fn is_empty(&self) -> bool {
        self.total_features == 0 && self.total_vertices == 0
    }
}
