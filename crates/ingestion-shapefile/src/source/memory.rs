//! In-memory feature source.

use std::path::Path;

use ingestion_core::result::AppResult;
use ingestion_entity::feature::Feature;

use super::{FeatureIter, FeatureSource};

/// Serves the same features for any path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureSource {
    features: Vec<Feature>,
}

impl MemoryFeatureSource {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

impl FeatureSource for MemoryFeatureSource {
    fn open(&self, _path: &Path) -> AppResult<FeatureIter> {
        Ok(Box::new(self.features.clone().into_iter().map(Ok)))
    }
}
