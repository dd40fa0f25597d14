//! Job tracker client.

use async_trait::async_trait;
use ingestion_core::result::AppResult;
use reqwest::Client;

use crate::error::ClientError;
use crate::http::{ensure_success, join_url};

/// Receives a notification whenever a task reaches a terminal outcome.
#[async_trait]
pub trait TaskTracker: Send + Sync + 'static {
    async fn notify(&self, task_id: &str) -> AppResult<()>;
}

#[derive(Debug, Clone)]
pub struct JobTrackerClient {
    http: Client,
    base_url: String,
}

impl JobTrackerClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TaskTracker for JobTrackerClient {
    async fn notify(&self, task_id: &str) -> AppResult<()> {
        let url = join_url(&self.base_url, &format!("tasks/{task_id}/notify"));
        let response = self.http.post(&url).send().await.map_err(ClientError::from)?;
        ensure_success("job tracker", response).await?;
        Ok(())
    }
}
