//! Per-chunk validation pipeline.

use async_trait::async_trait;
use tracing::debug;

use ingestion_client::PartsValidationService;
use ingestion_core::result::AppResult;
use ingestion_entity::feature::FeatureCollection;
use ingestion_entity::job::Job;
use ingestion_entity::shapefile::ShapefileChunk;
use ingestion_entity::validation::ValidationRequest;
use ingestion_shapefile::ChunkProcessor;
use ingestion_validation::{ErrorAggregator, MappingContext, ReportBuilder, validate_and_map};

use super::checkpoint::TaskCheckpointer;

/// Runs one chunk through mapping, the validation service and the report.
pub(crate) struct ChunkValidator<'a> {
    pub job: &'a Job,
    pub validation: &'a dyn PartsValidationService,
    pub aggregator: &'a mut ErrorAggregator,
    pub report_builder: &'a ReportBuilder,
    pub checkpointer: &'a TaskCheckpointer,
    pub mapping: MappingContext,
    pub max_vertices_per_chunk: u64,
}

impl ChunkValidator<'_> {
    fn request(&self, collection: FeatureCollection) -> ValidationRequest {
        ValidationRequest {
            job_type: self.job.job_type.clone(),
            catalog_id: self.job.parameters.catalog_id.clone(),
            product_id: self.job.resource_id.clone(),
            product_type: self.job.product_type.clone(),
            product_version: self.job.version.clone(),
            parts_data: collection,
        }
    }
}

#[async_trait]
impl ChunkProcessor for ChunkValidator<'_> {
    async fn process(&mut self, chunk: ShapefileChunk) -> AppResult<()> {
        let chunk_id = chunk.id;

        self.aggregator.add_vertices_errors(
            &chunk.skipped_features,
            chunk_id,
            self.max_vertices_per_chunk,
        );

        let mut originals = Vec::with_capacity(chunk.features.len());
        let mut mapped = Vec::with_capacity(chunk.features.len());
        for feature in chunk.features {
            match validate_and_map(&feature, &self.mapping) {
                Ok(part) => {
                    mapped.push(part);
                    originals.push(feature);
                }
                Err(issues) => self.aggregator.add_metadata_error(&issues, &feature, chunk_id),
            }
        }

        if !mapped.is_empty() {
            let parts = mapped.len();
            let request = self.request(FeatureCollection::new(mapped));
            let response = self.validation.validate(&request).await?;
            debug!(
                job_id = %self.job.id,
                chunk_id,
                parts,
                flagged = response.parts.len(),
                small_holes = response.small_holes_count,
                "Chunk validated"
            );
            self.aggregator
                .add_validation_errors(&response, &originals, chunk_id);
        }

        let flagged = self.aggregator.features_with_error_properties();
        self.report_builder
            .write_chunk(&flagged, &self.job.id, chunk_id)
            .await?;
        self.aggregator.clear_invalid_features();

        self.checkpointer
            .stage_counts(self.aggregator.aggregated_counts())
            .await;
        Ok(())
    }
}
