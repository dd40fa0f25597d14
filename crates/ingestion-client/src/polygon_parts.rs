//! Polygon parts validation service client.

use async_trait::async_trait;
use ingestion_core::result::AppResult;
use ingestion_entity::validation::{ValidationRequest, ValidationResponse};
use reqwest::Client;
use tracing::debug;

use crate::error::ClientError;
use crate::http::{decode_json, ensure_success, join_url};

const SERVICE: &str = "polygon parts";

/// Business-rule validation of a batch of parts.
#[async_trait]
pub trait PartsValidationService: Send + Sync + 'static {
    async fn validate(&self, request: &ValidationRequest) -> AppResult<ValidationResponse>;
}

#[derive(Debug, Clone)]
pub struct PolygonPartsClient {
    http: Client,
    base_url: String,
}

impl PolygonPartsClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PartsValidationService for PolygonPartsClient {
    async fn validate(&self, request: &ValidationRequest) -> AppResult<ValidationResponse> {
        let url = join_url(&self.base_url, "validate");
        debug!(
            product_id = %request.product_id,
            parts = request.parts_data.features.len(),
            "Sending parts for validation"
        );
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(ClientError::from)?;
        let response = ensure_success(SERVICE, response).await?;
        Ok(decode_json(SERVICE, response).await?)
    }
}
