//! Queue (job manager) type configuration.

use serde::{Deserialize, Serialize};

/// Which job and task types this worker dequeues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Task type dequeued for every job type.
    #[serde(default = "default_task_type")]
    pub task_type: String,
    /// Mapping from ingestion job kind to the job manager job type.
    #[serde(default)]
    pub job_types: JobTypesConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            task_type: default_task_type(),
            job_types: JobTypesConfig::default(),
        }
    }
}

/// Job manager job type names per ingestion job kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTypesConfig {
    /// Job type for new layer ingestion.
    #[serde(default = "default_new")]
    pub new: String,
    /// Job type for layer updates.
    #[serde(default = "default_update")]
    pub update: String,
    /// Job type for swap updates.
    #[serde(default = "default_swap_update")]
    pub swap_update: String,
}

impl JobTypesConfig {
    /// Job types in the fixed order they are polled.
    pub fn ordered(&self) -> [&str; 3] {
        [&self.new, &self.update, &self.swap_update]
    }
}

impl Default for JobTypesConfig {
    fn default() -> Self {
        Self {
            new: default_new(),
            update: default_update(),
            swap_update: default_swap_update(),
        }
    }
}

fn default_task_type() -> String {
    "validation".to_string()
}

fn default_new() -> String {
    "Ingestion_New".to_string()
}

fn default_update() -> String {
    "Ingestion_Update".to_string()
}

fn default_swap_update() -> String {
    "Ingestion_Swap_Update".to_string()
}
