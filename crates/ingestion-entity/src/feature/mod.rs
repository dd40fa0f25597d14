//! GeoJSON feature models.

pub mod geometry;
pub mod model;

pub use geometry::Geometry;
pub use model::{Feature, FeatureCollection};
