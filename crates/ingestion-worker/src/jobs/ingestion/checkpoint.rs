//! Task-backed reader checkpoints.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use ingestion_core::result::AppResult;
use ingestion_entity::report::Report;
use ingestion_entity::task::{ProcessingState, TaskParameters, TaskUpdate};
use ingestion_entity::validation::AggregatedCounts;
use ingestion_shapefile::Checkpointer;

use crate::queue::JobQueue;

/// Persists the reader position into the task's parameters.
///
/// Every update sends the full parameter object, merged with what the task
/// carried when it was dequeued.
pub struct TaskCheckpointer {
    queue: Arc<JobQueue>,
    job_id: String,
    task_id: String,
    parameters: Mutex<TaskParameters>,
}

impl TaskCheckpointer {
    pub fn new(
        queue: Arc<JobQueue>,
        job_id: impl Into<String>,
        task_id: impl Into<String>,
        parameters: TaskParameters,
    ) -> Self {
        Self {
            queue,
            job_id: job_id.into(),
            task_id: task_id.into(),
            parameters: Mutex::new(parameters),
        }
    }

    /// Counts to persist with the next checkpoint.
    pub async fn stage_counts(&self, counts: AggregatedCounts) {
        self.parameters.lock().await.aggregated_counts = Some(counts);
    }

    /// Store the final report on the task.
    pub async fn save_report(&self, report: Report) -> AppResult<()> {
        let mut parameters = self.parameters.lock().await;
        parameters.report = Some(report);
        self.queue
            .update_task(
                &self.job_id,
                &self.task_id,
                TaskUpdate::progress(100, parameters.clone()),
            )
            .await
    }
}

#[async_trait]
impl Checkpointer for TaskCheckpointer {
    async fn load(&self) -> AppResult<Option<ProcessingState>> {
        Ok(self.parameters.lock().await.processing_state.clone())
    }

    async fn save(&self, state: &ProcessingState) -> AppResult<()> {
        let percentage = state
            .progress
            .as_ref()
            .map(|p| p.rounded_percentage())
            .unwrap_or(0);

        let mut parameters = self.parameters.lock().await;
        parameters.processing_state = Some(state.clone());
        self.queue
            .update_task(
                &self.job_id,
                &self.task_id,
                TaskUpdate::progress(percentage, parameters.clone()),
            )
            .await?;

        debug!(
            task_id = %self.task_id,
            chunk = state.last_processed_chunk_index,
            percentage,
            "Checkpoint saved"
        );
        Ok(())
    }
}
