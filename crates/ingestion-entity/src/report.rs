//! Report artifact reference.

use serde::{Deserialize, Serialize};

/// A finalized validation report archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Absolute path of the archive on the worker's filesystem.
    pub path: String,
    pub file_name: String,
    /// Archive size in bytes.
    pub file_size: u64,
    /// Download URL, once uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}
