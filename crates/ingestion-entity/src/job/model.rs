//! Job entity model.

use serde::{Deserialize, Serialize};

use super::parameters::IngestionJobParameters;

/// An ingestion job as returned by the job manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job identifier.
    pub id: String,
    /// Queue job type (e.g. `"Ingestion_New"`).
    #[serde(rename = "type")]
    pub job_type: String,
    /// Product identifier the job ingests into.
    pub resource_id: String,
    /// Product version.
    pub version: String,
    /// Product type (e.g. `"Orthophoto"`).
    pub product_type: String,
    /// Job parameters.
    pub parameters: IngestionJobParameters,
}

impl Job {
    /// Check whether anyone asked to be notified about this job.
    pub fn has_callbacks(&self) -> bool {
        !self.parameters.callback_urls.is_empty()
    }

    /// Name used for artifacts produced on behalf of this job.
    pub fn entity_name(&self) -> String {
        format!("{}_{}", self.resource_id, self.product_type)
    }
}
