//! Per-feature validation errors.

use serde::{Deserialize, Serialize};

use super::category::ErrorCategory;
use crate::feature::Feature;

/// One finding attached to a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub error_type: ErrorCategory,
    /// Report column the message is written to.
    pub column_name: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(error_type: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            error_type,
            column_name: error_type.property_name().to_string(),
            message: message.into(),
        }
    }
}

/// A feature together with every finding recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidFeature {
    /// Feature id as reported (`"unknown"` when it has none).
    pub id: String,
    /// Chunk the feature was first flagged in.
    pub chunk_id: u32,
    pub feature: Feature,
    pub errors: Vec<ValidationError>,
}
