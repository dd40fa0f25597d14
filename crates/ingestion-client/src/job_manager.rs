//! Job manager client: the queue and task store.

use async_trait::async_trait;
use ingestion_core::result::AppResult;
use ingestion_entity::job::Job;
use ingestion_entity::task::{Task, TaskStatus, TaskUpdate};
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::ClientError;
use crate::http::{decode_json, ensure_success, join_url};

const SERVICE: &str = "job manager";

/// Queue and task-store operations the worker needs.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    /// Take the next pending task of the given job and task type, if any.
    async fn dequeue(&self, job_type: &str, task_type: &str) -> AppResult<Option<Task>>;

    async fn get_job(&self, job_id: &str) -> AppResult<Job>;

    async fn update_task(&self, job_id: &str, task_id: &str, update: TaskUpdate) -> AppResult<()>;

    /// Mark the task as completed.
    async fn ack(&self, job_id: &str, task_id: &str) -> AppResult<()>;

    /// Mark the task as failed; a resettable task returns to pending.
    async fn reject(
        &self,
        job_id: &str,
        task_id: &str,
        resettable: bool,
        reason: &str,
    ) -> AppResult<()>;
}

/// HTTP implementation of [`JobStore`].
#[derive(Debug, Clone)]
pub struct JobManagerClient {
    http: Client,
    base_url: String,
}

impl JobManagerClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl JobStore for JobManagerClient {
    async fn dequeue(&self, job_type: &str, task_type: &str) -> AppResult<Option<Task>> {
        let url = join_url(
            &self.base_url,
            &format!("tasks/{job_type}/{task_type}/startPending"),
        );
        let response = self.http.post(&url).send().await.map_err(ClientError::from)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(job_type, task_type, "No pending task");
            return Ok(None);
        }
        let response = ensure_success(SERVICE, response).await?;
        let task: Task = decode_json(SERVICE, response).await?;
        Ok(Some(task))
    }

    async fn get_job(&self, job_id: &str) -> AppResult<Job> {
        let url = join_url(&self.base_url, &format!("jobs/{job_id}"));
        let response = self.http.get(&url).send().await.map_err(ClientError::from)?;
        let response = ensure_success(SERVICE, response).await?;
        Ok(decode_json(SERVICE, response).await?)
    }

    async fn update_task(&self, job_id: &str, task_id: &str, update: TaskUpdate) -> AppResult<()> {
        let url = join_url(&self.base_url, &format!("jobs/{job_id}/tasks/{task_id}"));
        let response = self
            .http
            .put(&url)
            .json(&update)
            .send()
            .await
            .map_err(ClientError::from)?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn ack(&self, job_id: &str, task_id: &str) -> AppResult<()> {
        let update = TaskUpdate {
            status: Some(TaskStatus::Completed),
            percentage: Some(100),
            ..TaskUpdate::default()
        };
        self.update_task(job_id, task_id, update).await
    }

    async fn reject(
        &self,
        job_id: &str,
        task_id: &str,
        resettable: bool,
        reason: &str,
    ) -> AppResult<()> {
        let status = if resettable {
            TaskStatus::Pending
        } else {
            TaskStatus::Failed
        };
        let update = TaskUpdate {
            status: Some(status),
            reason: Some(reason.to_string()),
            resettable: Some(resettable),
            ..TaskUpdate::default()
        };
        self.update_task(job_id, task_id, update).await
    }
}
