//! Feature sources: where the chunked reader pulls features from.

pub mod memory;
pub mod shp;

use std::path::Path;

use ingestion_core::result::AppResult;
use ingestion_entity::feature::Feature;

pub use memory::MemoryFeatureSource;
pub use shp::ShapefileSource;

/// Sequential feature stream, in file order.
pub type FeatureIter = Box<dyn Iterator<Item = AppResult<Feature>> + Send>;

/// Opens a shapefile as a stream of features.
pub trait FeatureSource: Send + Sync + 'static {
    fn open(&self, path: &Path) -> AppResult<FeatureIter>;
}
