//! Ingestion job parameters.

use serde::{Deserialize, Serialize};

/// Parameters attached to an ingestion job by the job manager.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJobParameters {
    /// Shapefile path relative to the ingestion sources root, with or
    /// without the `.shp` extension.
    pub shapefile_path: String,
    /// Target resolution of the ingested parts, in degrees.
    pub ingestion_resolution: f64,
    /// URLs notified when the task finishes.
    #[serde(default)]
    pub callback_urls: Vec<String>,
    /// Catalog record of the product, absent for new products.
    #[serde(default)]
    pub catalog_id: Option<String>,
    /// Free-form parameters carried through retries.
    #[serde(default)]
    pub additional_params: serde_json::Map<String, serde_json::Value>,
}
