//! Feature and feature collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::geometry::{self, Geometry};

/// A GeoJSON feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    /// Top-level feature id, if the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Feature geometry (`null` for null shapes).
    #[serde(default, with = "geometry::as_geojson")]
    pub geometry: Option<Geometry>,
    /// Attribute table row.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    /// Create a feature from a geometry and its attributes.
    pub fn new(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            geometry,
            properties,
        }
    }

    /// Number of vertices in the feature's geometry.
    pub fn vertices_count(&self) -> u64 {
        self.geometry.as_ref().map_or(0, geometry::vertices_count)
    }

    /// The `id` attribute, when it is a non-empty string or a number.
    pub fn property_id(&self) -> Option<String> {
        match self.properties.get("id")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_id_accepts_strings_and_numbers() {
        let mut props = Map::new();
        props.insert("id".into(), json!(" part-7 "));
        assert_eq!(Feature::new(None, props).property_id().as_deref(), Some("part-7"));

        let mut props = Map::new();
        props.insert("id".into(), json!(42));
        assert_eq!(Feature::new(None, props).property_id().as_deref(), Some("42"));

        let mut props = Map::new();
        props.insert("id".into(), json!(""));
        assert!(Feature::new(None, props).property_id().is_none());
        assert!(Feature::new(None, Map::new()).property_id().is_none());
    }

    #[test]
    fn test_feature_carries_type_tag() {
        let feature = Feature::new(None, Map::new());
        let json = serde_json::to_value(&feature).unwrap();
        assert_eq!(json["type"], "Feature");
        assert!(json["geometry"].is_null());

        let collection = FeatureCollection::new(vec![feature]);
        let json = serde_json::to_value(&collection).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"].as_array().map(Vec::len), Some(1));
    }
}
