//! Layer writers for flagged features.

use std::path::Path;

use async_trait::async_trait;
use ingestion_entity::feature::Feature;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::ReportError;

/// WKT of EPSG:4326, written next to the geometry file.
pub const WGS84_PRJ: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],UNIT[\"Degree\",0.0174532925199433]]";

/// Writes features into an on-disk geospatial layer.
#[async_trait]
pub trait LayerWriter: Send + Sync {
    /// Extension of the file whose presence marks an existing layer.
    fn geometry_extension(&self) -> &'static str;

    /// Every file extension making up a layer, geometry file included.
    fn component_extensions(&self) -> &'static [&'static str];

    /// Create the layer (`append == false`) or append to it.
    async fn write_features(
        &self,
        dir: &Path,
        layer_name: &str,
        features: &[Feature],
        append: bool,
    ) -> Result<(), ReportError>;
}

/// Newline-delimited GeoJSON layer with a `.prj` side-file.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonSeqWriter;

#[async_trait]
impl LayerWriter for GeoJsonSeqWriter {
    fn geometry_extension(&self) -> &'static str {
        "geojsonl"
    }

    fn component_extensions(&self) -> &'static [&'static str] {
        &["geojsonl", "prj"]
    }

    async fn write_features(
        &self,
        dir: &Path,
        layer_name: &str,
        features: &[Feature],
        append: bool,
    ) -> Result<(), ReportError> {
        let geometry_path = dir.join(format!("{layer_name}.{}", self.geometry_extension()));
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&geometry_path)
            .await?;

        let mut buf = Vec::new();
        for feature in features {
            serde_json::to_writer(&mut buf, feature)?;
            buf.push(b'\n');
        }
        file.write_all(&buf).await?;
        file.flush().await?;

        if !append {
            tokio::fs::write(dir.join(format!("{layer_name}.prj")), WGS84_PRJ).await?;
        }
        Ok(())
    }
}
