//! Feature geometries.
//!
//! Geometries are held as `geo` types and only take their GeoJSON shape on
//! the wire.

use geo::CoordsIter;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use geo::Geometry;

/// Number of coordinates in the geometry, closing ring vertices included.
pub fn vertices_count(geometry: &Geometry) -> u64 {
    geometry.coords_count() as u64
}

/// GeoJSON type name the geometry serializes as.
pub fn type_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Check whether the geometry is areal.
pub fn is_polygonal(geometry: &Geometry) -> bool {
    matches!(
        geometry,
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_)
    )
}

/// `serde(with)` adapter writing an optional geometry as a GeoJSON object.
pub(crate) mod as_geojson {
    use super::*;

    pub fn serialize<S: Serializer>(
        geometry: &Option<Geometry>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        geometry
            .as_ref()
            .map(|g| geojson::Geometry::new(geojson::Value::from(g)))
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Geometry>, D::Error> {
        Option::<geojson::Geometry>::deserialize(deserializer)?
            .map(Geometry::try_from)
            .transpose()
            .map_err(serde::de::Error::custom)
    }
}
