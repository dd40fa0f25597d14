//! Error categories and their running counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    /// The feature alone exceeds the chunk vertex budget.
    Vertices,
    /// The attribute row failed structural validation.
    Metadata,
    GeometryValidity,
    Resolution,
    SmallGeometries,
    SmallHoles,
    /// The validation service returned a code the worker does not know.
    Unknown,
}

impl ErrorCategory {
    /// Every category, in report order.
    pub const ALL: [ErrorCategory; 7] = [
        Self::Vertices,
        Self::Metadata,
        Self::GeometryValidity,
        Self::Resolution,
        Self::SmallGeometries,
        Self::SmallHoles,
        Self::Unknown,
    ];

    /// Return the category as its camelCase key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vertices => "vertices",
            Self::Metadata => "metadata",
            Self::GeometryValidity => "geometryValidity",
            Self::Resolution => "resolution",
            Self::SmallGeometries => "smallGeometries",
            Self::SmallHoles => "smallHoles",
            Self::Unknown => "unknown",
        }
    }

    /// Attribute name of the synthesized report column.
    pub fn property_name(&self) -> &'static str {
        match self {
            Self::Vertices => "e_vertices",
            Self::Metadata => "e_metadata",
            Self::GeometryValidity => "e_validity",
            Self::Resolution => "e_res",
            Self::SmallGeometries => "e_sm_geom",
            Self::SmallHoles => "e_sm_holes",
            Self::Unknown => "e_unknown",
        }
    }

    /// Human-readable label used in the report metadata.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vertices => "Vertices",
            Self::Metadata => "Metadata",
            Self::GeometryValidity => "Geometry Validity",
            Self::Resolution => "Resolution",
            Self::SmallGeometries => "Small Geometries",
            Self::SmallHoles => "Small Holes",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether a single finding of this category makes the result critical.
    ///
    /// Small geometries and small holes only become critical through their
    /// percentage thresholds.
    pub fn is_always_critical(&self) -> bool {
        match self {
            Self::Vertices
            | Self::Metadata
            | Self::GeometryValidity
            | Self::Resolution
            | Self::Unknown => true,
            Self::SmallGeometries | Self::SmallHoles => false,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Running totals per error category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsCount {
    pub vertices: u64,
    pub metadata: u64,
    pub geometry_validity: u64,
    pub resolution: u64,
    pub small_geometries: u64,
    pub small_holes: u64,
    pub unknown: u64,
}

impl ErrorsCount {
    pub fn get(&self, category: ErrorCategory) -> u64 {
        match category {
            ErrorCategory::Vertices => self.vertices,
            ErrorCategory::Metadata => self.metadata,
            ErrorCategory::GeometryValidity => self.geometry_validity,
            ErrorCategory::Resolution => self.resolution,
            ErrorCategory::SmallGeometries => self.small_geometries,
            ErrorCategory::SmallHoles => self.small_holes,
            ErrorCategory::Unknown => self.unknown,
        }
    }

    pub fn increment(&mut self, category: ErrorCategory) {
        let slot = match category {
            ErrorCategory::Vertices => &mut self.vertices,
            ErrorCategory::Metadata => &mut self.metadata,
            ErrorCategory::GeometryValidity => &mut self.geometry_validity,
            ErrorCategory::Resolution => &mut self.resolution,
            ErrorCategory::SmallGeometries => &mut self.small_geometries,
            ErrorCategory::SmallHoles => &mut self.small_holes,
            ErrorCategory::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        ErrorCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// Aggregate counters carried on the task so a resumed run keeps the
/// totals of the chunks processed before it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCounts {
    pub errors_count: ErrorsCount,
    pub small_holes_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_targets_one_category() {
        let mut counts = ErrorsCount::default();
        counts.increment(ErrorCategory::Resolution);
        counts.increment(ErrorCategory::Resolution);
        counts.increment(ErrorCategory::SmallHoles);
        assert_eq!(counts.get(ErrorCategory::Resolution), 2);
        assert_eq!(counts.get(ErrorCategory::SmallHoles), 1);
        assert_eq!(counts.get(ErrorCategory::Vertices), 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_only_threshold_categories_are_conditional() {
        let conditional: Vec<_> = ErrorCategory::ALL
            .iter()
            .filter(|c| !c.is_always_critical())
            .collect();
        assert_eq!(
            conditional,
            vec![&ErrorCategory::SmallGeometries, &ErrorCategory::SmallHoles]
        );
    }
}
