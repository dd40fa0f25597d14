//! Threshold evaluation results.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdStatus {
    pub exceeded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmallHolesStatus {
    pub exceeded: bool,
    /// Small holes reported by the validation service across all chunks.
    pub count: u64,
}

/// Outcome of the percentage-based checks against the whole file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsResult {
    pub small_geometries: ThresholdStatus,
    pub small_holes: SmallHolesStatus,
}

impl ThresholdsResult {
    pub fn any_exceeded(&self) -> bool {
        self.small_geometries.exceeded || self.small_holes.exceeded
    }
}
