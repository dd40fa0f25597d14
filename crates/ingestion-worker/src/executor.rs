//! Job executor: dispatches tasks to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use ingestion_core::error::AppError;
use ingestion_entity::job::{Job, JobKind};
use ingestion_entity::report::Report;
use ingestion_entity::task::Task;

/// Failures that retrying the task cannot fix.
#[derive(Debug, thiserror::Error)]
pub enum UnrecoverableTaskError {
    #[error("Shapefile {path} is missing required files: {}", .missing.join(", "))]
    ShapefileNotFound { path: String, missing: Vec<String> },

    #[error("Task reached the maximum number of attempts ({attempts}/{max})")]
    MaxAttemptsReached { attempts: u32, max: u32 },

    #[error("Shapefile {path} contains no features")]
    EmptyShapefile { path: String },
}

/// Error from processing a task.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Rejected without reset; the task will not be handed out again.
    #[error(transparent)]
    Unrecoverable(#[from] UnrecoverableTaskError),

    /// Rejected with reset so the queue can retry it.
    #[error(transparent)]
    Recoverable(#[from] AppError),
}

impl JobExecutionError {
    pub fn is_resettable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }
}

/// What a successful task produced.
#[derive(Debug, Clone, Default)]
pub struct JobOutcome {
    pub report: Option<Report>,
}

impl JobOutcome {
    pub fn report_url(&self) -> Option<String> {
        self.report.as_ref().and_then(|r| r.url.clone())
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Job kinds this handler processes.
    fn job_kinds(&self) -> &[JobKind];

    async fn process_job(&self, job: &Job, task: &Task) -> Result<JobOutcome, JobExecutionError>;
}

/// Dispatches tasks to the handler registered for their job kind.
#[derive(Default)]
pub struct JobExecutor {
    handlers: HashMap<JobKind, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every kind it declares.
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        for kind in handler.job_kinds() {
            info!(job_kind = kind.as_str(), "Registered job handler");
            self.handlers.insert(*kind, Arc::clone(&handler));
        }
    }

    pub fn has_handler(&self, kind: JobKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub async fn execute(
        &self,
        kind: JobKind,
        job: &Job,
        task: &Task,
    ) -> Result<JobOutcome, JobExecutionError> {
        let handler = self.handlers.get(&kind).ok_or_else(|| {
            AppError::not_implemented(format!(
                "No handler registered for job kind '{}'",
                kind.as_str()
            ))
        })?;

        debug!(
            job_id = %job.id,
            task_id = %task.id,
            job_kind = kind.as_str(),
            attempts = task.attempts,
            "Dispatching task"
        );
        handler.process_job(job, task).await
    }
}
