//! Task and callback status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a task in the job manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Waiting to be dequeued (also the target of a resettable reject).
    #[serde(rename = "Pending")]
    Pending,
    /// Dequeued by a worker.
    #[serde(rename = "In-Progress")]
    InProgress,
    /// Finished successfully.
    #[serde(rename = "Completed")]
    Completed,
    /// Finished with a non-resettable failure.
    #[serde(rename = "Failed")]
    Failed,
}

impl TaskStatus {
    /// Return the status as the job manager spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In-Progress",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome reported to callback URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallbackStatus {
    /// The task completed (possibly with a report of findings).
    Completed,
    /// The task failed.
    Failed,
}

impl fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}
