//! Validation threshold configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Percentage thresholds above which tolerated findings become critical.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct ValidationConfig {
    /// Maximum share of features (percent) allowed to be small geometries.
    #[serde(default = "default_small_geometries")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub small_geometries_threshold_percentage: f64,
    /// Maximum small holes (percent of total features) allowed.
    #[serde(default = "default_small_holes")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub small_holes_threshold_percentage: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            small_geometries_threshold_percentage: default_small_geometries(),
            small_holes_threshold_percentage: default_small_holes(),
        }
    }
}

fn default_small_geometries() -> f64 {
    5.0
}

fn default_small_holes() -> f64 {
    5.0
}
