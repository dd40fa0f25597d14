//! Shapefile ingestion configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where shapefiles live and how they are chunked.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IngestionConfig {
    /// Root directory job shapefile paths are resolved against.
    #[serde(default = "default_sources_root")]
    pub sources_root: String,
    /// Maximum total vertices in a single chunk.
    #[serde(default = "default_max_vertices_per_chunk")]
    #[validate(range(min = 1))]
    pub max_vertices_per_chunk: u64,
    /// Sibling file extensions that must exist next to the shapefile.
    #[serde(default = "default_required_extensions")]
    #[validate(length(min = 1))]
    pub required_extensions: Vec<String>,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            sources_root: default_sources_root(),
            max_vertices_per_chunk: default_max_vertices_per_chunk(),
            required_extensions: default_required_extensions(),
        }
    }
}

fn default_sources_root() -> String {
    "./data/ingestion-sources".to_string()
}

fn default_max_vertices_per_chunk() -> u64 {
    100_000
}

fn default_required_extensions() -> Vec<String> {
    ["shp", "shx", "dbf", "prj", "cpg"]
        .iter()
        .map(|e| e.to_string())
        .collect()
}
