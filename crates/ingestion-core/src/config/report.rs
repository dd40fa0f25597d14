//! Validation report configuration.

use serde::{Deserialize, Serialize};

/// Where reports are built and how they are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Root directory for job-scoped report output.
    #[serde(default = "default_reports_root")]
    pub reports_root: String,
    /// Where finished reports are published: `"fs"` or `"s3"`.
    #[serde(default = "default_storage_provider")]
    pub storage_provider: String,
    /// Public base URL that serves `reports_root` when using the fs provider.
    #[serde(default)]
    pub download_base_url: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reports_root: default_reports_root(),
            storage_provider: default_storage_provider(),
            download_base_url: String::new(),
        }
    }
}

fn default_reports_root() -> String {
    "./data/reports".to_string()
}

fn default_storage_provider() -> String {
    "fs".to_string()
}
