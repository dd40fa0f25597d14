//! Callback delivery to job subscribers.

use async_trait::async_trait;
use ingestion_core::result::AppResult;
use ingestion_entity::callback::CallbackPayload;
use reqwest::Client;

use crate::error::ClientError;
use crate::http::ensure_success;

#[async_trait]
pub trait CallbackSender: Send + Sync + 'static {
    async fn send(&self, url: &str, payload: &CallbackPayload) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct HttpCallbackSender {
    http: Client,
}

impl HttpCallbackSender {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CallbackSender for HttpCallbackSender {
    async fn send(&self, url: &str, payload: &CallbackPayload) -> AppResult<()> {
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(ClientError::from)?;
        ensure_success("callback target", response).await?;
        Ok(())
    }
}
