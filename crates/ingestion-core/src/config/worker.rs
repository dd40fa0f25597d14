//! Job processor loop configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Job processor loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WorkerConfig {
    /// Delay in seconds before polling again when no task was dequeued.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Attempt count at which a task is rejected without processing.
    #[serde(default = "default_max_task_attempts")]
    #[validate(range(min = 1))]
    pub max_task_attempts: u32,
    /// Prefix used when generating the worker identifier.
    #[serde(default = "default_worker_id_prefix")]
    pub worker_id_prefix: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            max_task_attempts: default_max_task_attempts(),
            worker_id_prefix: default_worker_id_prefix(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_task_attempts() -> u32 {
    3
}

fn default_worker_id_prefix() -> String {
    "polygon-parts-worker".to_string()
}
