//! Per-task accumulation of validation findings.
//!
//! The aggregator is a plain in-memory state machine owned by one task.
//! It keeps one [`InvalidFeature`] per flagged feature, a running count per
//! [`ErrorCategory`] and the small-holes total reported by the validation
//! service. Thresholds are evaluated against the whole-file feature count
//! set through [`ErrorAggregator::set_shapefile_stats`].

use std::collections::HashMap;

use ingestion_core::config::validation::ValidationConfig;
use ingestion_entity::feature::Feature;
use ingestion_entity::shapefile::ShapefileStats;
use ingestion_entity::validation::{
    AggregatedCounts, ErrorCategory, ErrorsCount, InvalidFeature, SmallHolesStatus, ThresholdStatus,
    ThresholdsResult, ValidationError, ValidationErrorCode, ValidationResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Separator between structural issues of one feature.
pub const METADATA_ISSUE_SEPARATOR: &str = ", ";
/// Separator between messages of one category on the same feature.
pub const CATEGORY_MESSAGE_SEPARATOR: &str = "; ";
/// Id reported for features without a usable `id` attribute.
pub const UNKNOWN_FEATURE_ID: &str = "unknown";

/// Counts and threshold verdicts handed to the report builder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorSummary {
    pub errors_count: ErrorsCount,
    pub thresholds: ThresholdsResult,
}

/// Read-only snapshot of the aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationStatistics {
    pub features_with_errors: usize,
    pub total_errors: u64,
    pub errors_count: ErrorsCount,
    pub thresholds: ThresholdsResult,
    pub shapefile_stats: Option<ShapefileStats>,
}

#[derive(Debug)]
pub struct ErrorAggregator {
    thresholds: ValidationConfig,
    invalid_features: Vec<InvalidFeature>,
    index: HashMap<String, usize>,
    counts: ErrorsCount,
    small_holes_count: u64,
    stats: Option<ShapefileStats>,
    unknown_ordinal: u64,
}

impl ErrorAggregator {
    pub fn new(thresholds: ValidationConfig) -> Self {
        Self {
            thresholds,
            invalid_features: Vec::new(),
            index: HashMap::new(),
            counts: ErrorsCount::default(),
            small_holes_count: 0,
            stats: None,
            unknown_ordinal: 0,
        }
    }

    /// Whole-file totals; call once before adding threshold-sensitive errors.
    pub fn set_shapefile_stats(&mut self, stats: ShapefileStats) {
        self.stats = Some(stats);
    }

    /// Continue from totals persisted by an earlier run of the task.
    pub fn restore_counts(&mut self, counts: AggregatedCounts) {
        self.counts = counts.errors_count;
        self.small_holes_count = counts.small_holes_count;
    }

    pub fn aggregated_counts(&self) -> AggregatedCounts {
        AggregatedCounts {
            errors_count: self.counts,
            small_holes_count: self.small_holes_count,
        }
    }

    /// One vertices error per feature that exceeded the chunk budget.
    pub fn add_vertices_errors(&mut self, features: &[Feature], chunk_id: u32, limit: u64) {
        for feature in features {
            let message = format!(
                "Feature has {} vertices, exceeding the limit of {limit}",
                feature.vertices_count()
            );
            self.record(
                feature,
                chunk_id,
                ValidationError::new(ErrorCategory::Vertices, message),
            );
        }
    }

    /// All structural issues of a feature, as a single metadata error.
    pub fn add_metadata_error(&mut self, issues: &[String], feature: &Feature, chunk_id: u32) {
        let message = issues.join(METADATA_ISSUE_SEPARATOR);
        self.record(
            feature,
            chunk_id,
            ValidationError::new(ErrorCategory::Metadata, message),
        );
    }

    /// Fold a validation service response for one chunk.
    pub fn add_validation_errors(
        &mut self,
        response: &ValidationResponse,
        chunk_features: &[Feature],
        chunk_id: u32,
    ) {
        let by_id: HashMap<String, &Feature> = chunk_features
            .iter()
            .filter_map(|f| f.property_id().map(|id| (id, f)))
            .collect();

        for part in &response.parts {
            let Some(feature) = by_id.get(&part.id) else {
                warn!(chunk_id, part_id = %part.id, "Validation result for a feature not in chunk");
                continue;
            };
            for raw in &part.errors {
                let code = ValidationErrorCode::from(raw.as_str());
                let error = ValidationError::new(code.category(), code.message(raw));
                self.record(feature, chunk_id, error);
            }
        }
        self.small_holes_count += response.small_holes_count;
    }

    fn record(&mut self, feature: &Feature, chunk_id: u32, error: ValidationError) {
        self.counts.increment(error.error_type);

        let (key, id) = match feature.property_id() {
            Some(id) => (id.clone(), id),
            None => {
                self.unknown_ordinal += 1;
                (
                    format!("{UNKNOWN_FEATURE_ID}-{chunk_id}-{}", self.unknown_ordinal),
                    UNKNOWN_FEATURE_ID.to_string(),
                )
            }
        };

        if let Some(&position) = self.index.get(&key) {
            self.invalid_features[position].errors.push(error);
            return;
        }
        debug!(chunk_id, feature_id = %id, category = %error.error_type, "Feature flagged");
        self.index.insert(key, self.invalid_features.len());
        self.invalid_features.push(InvalidFeature {
            id,
            chunk_id,
            feature: feature.clone(),
            errors: vec![error],
        });
    }

    /// True when any held feature has at least one recorded error.
    ///
    /// Looks at the features accumulated since the last
    /// [`clear_invalid_features`](Self::clear_invalid_features), not at the
    /// running counts.
    pub fn has_errors(&self) -> bool {
        self.invalid_features.iter().any(|f| !f.errors.is_empty())
    }

    /// Whether the findings warrant persisting a report.
    pub fn has_critical_errors(&self) -> bool {
        let always_critical = ErrorCategory::ALL
            .iter()
            .filter(|c| c.is_always_critical())
            .any(|c| self.counts.get(*c) > 0);
        always_critical || self.thresholds_info().any_exceeded()
    }

    pub fn error_counts(&self) -> ErrorsCount {
        self.counts
    }

    pub fn thresholds_info(&self) -> ThresholdsResult {
        let total = self.stats.map_or(0, |s| s.total_features);
        let exceeds = |count: u64, threshold: f64| {
            total > 0 && (count as f64 / total as f64 * 100.0) > threshold
        };
        ThresholdsResult {
            small_geometries: ThresholdStatus {
                exceeded: exceeds(
                    self.counts.small_geometries,
                    self.thresholds.small_geometries_threshold_percentage,
                ),
            },
            small_holes: SmallHolesStatus {
                exceeded: exceeds(
                    self.small_holes_count,
                    self.thresholds.small_holes_threshold_percentage,
                ),
                count: self.small_holes_count,
            },
        }
    }

    pub fn summary(&self) -> ErrorSummary {
        ErrorSummary {
            errors_count: self.counts,
            thresholds: self.thresholds_info(),
        }
    }

    pub fn statistics(&self) -> AggregationStatistics {
        AggregationStatistics {
            features_with_errors: self.invalid_features.len(),
            total_errors: self.counts.total(),
            errors_count: self.counts,
            thresholds: self.thresholds_info(),
            shapefile_stats: self.stats,
        }
    }

    pub fn invalid_features(&self) -> &[InvalidFeature] {
        &self.invalid_features
    }

    /// Flagged features with one `e_*` property per category present.
    ///
    /// Messages of the same category are joined; original properties are
    /// kept as they were.
    pub fn features_with_error_properties(&self) -> Vec<Feature> {
        self.invalid_features
            .iter()
            .map(|invalid| {
                let mut feature = invalid.feature.clone();
                for category in ErrorCategory::ALL {
                    let messages: Vec<&str> = invalid
                        .errors
                        .iter()
                        .filter(|e| e.error_type == category)
                        .map(|e| e.message.as_str())
                        .collect();
                    if !messages.is_empty() {
                        feature.properties.insert(
                            category.property_name().to_string(),
                            messages.join(CATEGORY_MESSAGE_SEPARATOR).into(),
                        );
                    }
                }
                feature
            })
            .collect()
    }

    /// Reset everything, shapefile stats included.
    pub fn clear(&mut self) {
        self.clear_invalid_features();
        self.counts = ErrorsCount::default();
        self.small_holes_count = 0;
        self.stats = None;
        self.unknown_ordinal = 0;
    }

    /// Drop the per-feature map only; counts, thresholds and stats stay.
    pub fn clear_invalid_features(&mut self) {
        self.invalid_features.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use ingestion_entity::feature::Geometry;
    use ingestion_entity::validation::PartValidationResult;
    use serde_json::{Map, json};

    fn thresholds() -> ValidationConfig {
        ValidationConfig {
            small_geometries_threshold_percentage: 5.0,
            small_holes_threshold_percentage: 5.0,
        }
    }

    fn feature(id: Option<&str>) -> Feature {
        let mut props = Map::new();
        if let Some(id) = id {
            props.insert("id".into(), json!(id));
        }
        props.insert("sourceName".into(), json!("pass 1"));
        let ring = LineString::from(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)]);
        Feature::new(Some(Geometry::Polygon(Polygon::new(ring, vec![]))), props)
    }

    fn response(parts: Vec<(&str, Vec<&str>)>, small_holes: u64) -> ValidationResponse {
        ValidationResponse {
            parts: parts
                .into_iter()
                .map(|(id, errors)| PartValidationResult {
                    id: id.to_string(),
                    errors: errors.iter().map(|e| e.to_string()).collect(),
                })
                .collect(),
            small_holes_count: small_holes,
        }
    }

    fn aggregator(total_features: u64) -> ErrorAggregator {
        let mut aggregator = ErrorAggregator::new(thresholds());
        aggregator.set_shapefile_stats(ShapefileStats {
            total_features,
            total_vertices: total_features * 4,
        });
        aggregator
    }

    #[test]
    fn test_same_feature_accumulates_across_chunks() {
        let mut agg = aggregator(100);
        let f = feature(Some("a"));
        agg.add_vertices_errors(std::slice::from_ref(&f), 0, 10);
        agg.add_validation_errors(&response(vec![("a", vec!["Resolution"])], 0), &[f], 3);

        assert_eq!(agg.invalid_features().len(), 1);
        let invalid = &agg.invalid_features()[0];
        assert_eq!(invalid.chunk_id, 0);
        assert_eq!(invalid.errors.len(), 2);
        assert_eq!(agg.error_counts().vertices, 1);
        assert_eq!(agg.error_counts().resolution, 1);
    }

    #[test]
    fn test_metadata_issues_joined_into_one_error() {
        let mut agg = aggregator(10);
        let issues = vec!["id is required".to_string(), "ep90 must be a number".to_string()];
        agg.add_metadata_error(&issues, &feature(None), 1);

        let invalid = &agg.invalid_features()[0];
        assert_eq!(invalid.id, UNKNOWN_FEATURE_ID);
        assert_eq!(invalid.errors.len(), 1);
        assert_eq!(invalid.errors[0].message, "id is required, ep90 must be a number");
        assert_eq!(invalid.errors[0].column_name, "e_metadata");
    }

    #[test]
    fn test_features_without_id_are_not_merged() {
        let mut agg = aggregator(10);
        agg.add_metadata_error(&["id is required".to_string()], &feature(None), 0);
        agg.add_metadata_error(&["id is required".to_string()], &feature(None), 0);

        assert_eq!(agg.invalid_features().len(), 2);
        assert!(agg.invalid_features().iter().all(|f| f.id == "unknown"));
        assert_eq!(agg.error_counts().metadata, 2);
    }

    #[test]
    fn test_unreported_feature_is_skipped_and_unknown_code_counted() {
        let mut agg = aggregator(100);
        let chunk = vec![feature(Some("a"))];
        agg.add_validation_errors(
            &response(
                vec![("missing", vec!["Resolution"]), ("a", vec!["Brand_New_Check"])],
                0,
            ),
            &chunk,
            0,
        );

        assert_eq!(agg.invalid_features().len(), 1);
        assert_eq!(agg.error_counts().resolution, 0);
        assert_eq!(agg.error_counts().unknown, 1);
        assert!(agg.has_critical_errors());
    }

    #[test]
    fn test_category_messages_concatenated_per_property() {
        let mut agg = aggregator(1000);
        let chunk = vec![feature(Some("a")), feature(Some("b"))];
        agg.add_validation_errors(
            &response(
                vec![
                    ("a", vec!["Geometry_Validity", "Foo", "Bar"]),
                    ("b", vec!["Small_Geometry"]),
                ],
                0,
            ),
            &chunk,
            0,
        );

        let features = agg.features_with_error_properties();
        let a = &features[0];
        assert_eq!(a.properties["sourceName"], "pass 1");
        assert_eq!(a.properties["e_validity"], "Geometry is not valid");
        assert_eq!(
            a.properties["e_unknown"],
            "Unrecognized validation error: Foo; Unrecognized validation error: Bar"
        );
        assert!(a.properties.get("e_sm_geom").is_none());

        let b = &features[1];
        assert_eq!(b.properties["e_sm_geom"], "Geometry area is below the minimum");
        assert!(b.properties.get("e_unknown").is_none());
    }

    #[test]
    fn test_small_geometries_only_critical_past_threshold() {
        let mut agg = aggregator(100);
        let chunk: Vec<Feature> = (0..6).map(|i| feature(Some(&format!("f{i}")))).collect();

        let ids: Vec<String> = (0..5).map(|i| format!("f{i}")).collect();
        let parts = ids
            .iter()
            .map(|id| (id.as_str(), vec!["Small_Geometry"]))
            .collect();
        agg.add_validation_errors(&response(parts, 0), &chunk, 0);
        assert!(agg.has_errors());
        assert!(!agg.thresholds_info().small_geometries.exceeded);
        assert!(!agg.has_critical_errors());

        agg.add_validation_errors(&response(vec![("f5", vec!["Small_Geometry"])], 0), &chunk, 1);
        assert!(agg.thresholds_info().small_geometries.exceeded);
        assert!(agg.has_critical_errors());
    }

    #[test]
    fn test_small_holes_threshold_uses_service_count() {
        let mut agg = aggregator(100);
        agg.add_validation_errors(&response(vec![], 4), &[], 0);
        agg.add_validation_errors(&response(vec![], 2), &[], 1);

        let info = agg.thresholds_info();
        assert_eq!(info.small_holes.count, 6);
        assert!(info.small_holes.exceeded);
        assert!(agg.has_critical_errors());
        assert!(!agg.has_errors());
    }

    #[test]
    fn test_thresholds_not_exceeded_without_stats() {
        let mut agg = ErrorAggregator::new(thresholds());
        agg.add_validation_errors(&response(vec![], 50), &[], 0);
        assert!(!agg.thresholds_info().small_holes.exceeded);
    }

    #[test]
    fn test_clear_invalid_features_keeps_counts_and_thresholds() {
        let mut agg = aggregator(10);
        let chunk = vec![feature(Some("a"))];
        agg.add_validation_errors(&response(vec![("a", vec!["Small_Geometry"])], 3), &chunk, 0);
        let counts = agg.error_counts();
        let thresholds = agg.thresholds_info();
        assert!(agg.has_errors());

        agg.clear_invalid_features();
        assert!(!agg.has_errors());
        assert!(agg.invalid_features().is_empty());
        assert!(agg.features_with_error_properties().is_empty());
        assert_eq!(agg.error_counts(), counts);
        assert_eq!(agg.thresholds_info(), thresholds);
        assert!(thresholds.small_holes.exceeded);

        agg.clear();
        assert_eq!(agg.error_counts(), ErrorsCount::default());
        assert_eq!(agg.thresholds_info(), ThresholdsResult::default());
        assert!(agg.statistics().shapefile_stats.is_none());
    }

    #[test]
    fn test_restored_counts_drive_criticality() {
        let mut agg = aggregator(100);
        assert!(!agg.has_critical_errors());

        let mut counts = AggregatedCounts::default();
        counts.errors_count.metadata = 1;
        counts.small_holes_count = 2;
        agg.restore_counts(counts);

        assert!(agg.has_critical_errors());
        assert!(agg.invalid_features().is_empty());
        assert!(!agg.has_errors());
        assert_eq!(agg.aggregated_counts(), counts);
    }

    #[test]
    fn test_statistics_snapshot() {
        let mut agg = aggregator(10);
        agg.add_vertices_errors(&[feature(Some("a")), feature(Some("b"))], 0, 4);
        let stats = agg.statistics();
        assert_eq!(stats.features_with_errors, 2);
        assert_eq!(stats.total_errors, 2);
        assert_eq!(stats.errors_count.vertices, 2);
        assert_eq!(stats.shapefile_stats.map(|s| s.total_features), Some(10));
    }
}
