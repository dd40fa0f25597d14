//! External service endpoints.

use serde::{Deserialize, Serialize};

/// Base URLs and HTTP settings for the services the worker calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Job manager (queue and task store) base URL.
    pub job_manager_url: String,
    /// Job tracker base URL.
    pub job_tracker_url: String,
    /// Polygon parts validation service base URL.
    pub polygon_parts_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    120
}
