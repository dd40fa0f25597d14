//! Wire types of the polygon parts validation service.

use serde::{Deserialize, Serialize};

use super::category::ErrorCategory;
use crate::feature::FeatureCollection;

/// Body of `POST /validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub job_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    pub product_id: String,
    pub product_type: String,
    pub product_version: String,
    pub parts_data: FeatureCollection,
}

/// Response of `POST /validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    /// Only parts with at least one violation are listed.
    #[serde(default)]
    pub parts: Vec<PartValidationResult>,
    #[serde(default)]
    pub small_holes_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartValidationResult {
    pub id: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Violation codes returned by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    GeometryValidity,
    Resolution,
    SmallGeometry,
    SmallHoles,
    Unknown,
}

impl From<&str> for ValidationErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "Geometry_Validity" | "geometryValidity" => Self::GeometryValidity,
            "Resolution" | "resolution" => Self::Resolution,
            "Small_Geometry" | "smallGeometry" | "smallGeometries" => Self::SmallGeometry,
            "Small_Holes" | "smallHoles" => Self::SmallHoles,
            _ => Self::Unknown,
        }
    }
}

impl ValidationErrorCode {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GeometryValidity => ErrorCategory::GeometryValidity,
            Self::Resolution => ErrorCategory::Resolution,
            Self::SmallGeometry => ErrorCategory::SmallGeometries,
            Self::SmallHoles => ErrorCategory::SmallHoles,
            Self::Unknown => ErrorCategory::Unknown,
        }
    }

    /// Message written to the report for this violation.
    pub fn message(&self, raw: &str) -> String {
        match self {
            Self::GeometryValidity => "Geometry is not valid".to_string(),
            Self::Resolution => "Resolution conflicts with existing parts".to_string(),
            Self::SmallGeometry => "Geometry area is below the minimum".to_string(),
            Self::SmallHoles => "Polygon contains holes below the minimum area".to_string(),
            Self::Unknown => format!("Unrecognized validation error: {raw}"),
        }
    }
}
