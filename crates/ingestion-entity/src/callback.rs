//! Callback payload sent to job subscribers.

use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::task::{CallbackStatus, Task};

/// Body posted to every callback URL of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    pub job_id: String,
    pub task_id: String,
    pub status: CallbackStatus,
    pub job_type: String,
    pub product_id: String,
    pub product_type: String,
    pub version: String,
    pub task_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CallbackPayload {
    /// Build the payload for a finished task.
    pub fn for_task(job: &Job, task: &Task, status: CallbackStatus) -> Self {
        Self {
            job_id: job.id.clone(),
            task_id: task.id.clone(),
            status,
            job_type: job.job_type.clone(),
            product_id: job.resource_id.clone(),
            product_type: job.product_type.clone(),
            version: job.version.clone(),
            task_type: task.task_type.clone(),
            report_url: None,
            message: None,
        }
    }
}
