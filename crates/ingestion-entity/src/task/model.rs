//! Task entity model.

use serde::{Deserialize, Serialize};

use super::state::ProcessingState;
use super::status::TaskStatus;
use crate::report::Report;
use crate::validation::AggregatedCounts;

/// A task dequeued from the job manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Owning job.
    pub job_id: String,
    /// Queue task type (e.g. `"validation"`).
    #[serde(rename = "type")]
    pub task_type: String,
    /// How many times the queue has handed this task out before.
    #[serde(default)]
    pub attempts: u32,
    /// Last persisted completion percentage.
    #[serde(default)]
    pub percentage: Option<u8>,
    /// Task parameters, including the checkpoint.
    #[serde(default)]
    pub parameters: TaskParameters,
}

/// Mutable task parameters.
///
/// Unknown keys are preserved so a merged update never drops what other
/// services stored on the task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParameters {
    /// Reader checkpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_state: Option<ProcessingState>,
    /// Error totals of the chunks covered by `processing_state`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregated_counts: Option<AggregatedCounts>,
    /// Report produced by the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body of an update-task call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TaskParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resettable: Option<bool>,
}

impl TaskUpdate {
    /// Progress update carrying merged parameters.
    pub fn progress(percentage: u8, parameters: TaskParameters) -> Self {
        Self {
            percentage: Some(percentage),
            parameters: Some(parameters),
            ..Self::default()
        }
    }
}
