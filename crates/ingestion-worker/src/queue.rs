//! Job queue facade over the job manager.
//!
//! Maps the configured job manager job types onto [`JobKind`] and polls
//! them in a fixed order: new, update, swap update.

use std::sync::Arc;

use tracing::{debug, trace};

use ingestion_client::JobStore;
use ingestion_core::config::queue::QueueConfig;
use ingestion_core::result::AppResult;
use ingestion_entity::job::{Job, JobKind};
use ingestion_entity::task::{Task, TaskUpdate};

#[derive(Clone)]
pub struct JobQueue {
    store: Arc<dyn JobStore>,
    config: QueueConfig,
}

impl JobQueue {
    pub fn new(store: Arc<dyn JobStore>, config: QueueConfig) -> Self {
        Self { store, config }
    }

    /// Job manager job type polled for `kind`.
    pub fn job_type(&self, kind: JobKind) -> &str {
        let types = &self.config.job_types;
        match kind {
            JobKind::New => &types.new,
            JobKind::Update => &types.update,
            JobKind::SwapUpdate => &types.swap_update,
        }
    }

    pub fn task_type(&self) -> &str {
        &self.config.task_type
    }

    /// Claim the first pending task across the configured job types.
    pub async fn dequeue(&self) -> AppResult<Option<(JobKind, Task)>> {
        for kind in JobKind::ALL {
            let job_type = self.job_type(kind);
            if let Some(task) = self.store.dequeue(job_type, self.task_type()).await? {
                debug!(
                    task_id = %task.id,
                    job_id = %task.job_id,
                    job_type,
                    attempts = task.attempts,
                    "Dequeued task"
                );
                return Ok(Some((kind, task)));
            }
            trace!(job_type, "No pending task");
        }
        Ok(None)
    }

    pub async fn get_job(&self, job_id: &str) -> AppResult<Job> {
        self.store.get_job(job_id).await
    }

    pub async fn update_task(&self, job_id: &str, task_id: &str, update: TaskUpdate) -> AppResult<()> {
        self.store.update_task(job_id, task_id, update).await
    }

    pub async fn ack(&self, job_id: &str, task_id: &str) -> AppResult<()> {
        self.store.ack(job_id, task_id).await
    }

    pub async fn reject(
        &self,
        job_id: &str,
        task_id: &str,
        resettable: bool,
        reason: &str,
    ) -> AppResult<()> {
        self.store.reject(job_id, task_id, resettable, reason).await
    }
}
