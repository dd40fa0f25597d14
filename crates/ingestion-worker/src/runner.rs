//! Job processor: the main loop that polls for tasks and settles them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{error, info, warn};

use ingestion_client::TaskTracker;
use ingestion_core::config::worker::WorkerConfig;
use ingestion_entity::job::{Job, JobKind};
use ingestion_entity::task::{CallbackStatus, Task};

use crate::callback::CallbackNotifier;
use crate::executor::{JobExecutionError, JobExecutor, JobOutcome, UnrecoverableTaskError};
use crate::queue::JobQueue;

/// Result of one polling iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// Nothing was dequeued.
    Idle,
    Completed { task_id: String },
    Rejected { task_id: String, resettable: bool },
}

/// Polls the queue and processes one task at a time.
pub struct JobProcessor {
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    tracker: Arc<dyn TaskTracker>,
    callbacks: CallbackNotifier,
    config: WorkerConfig,
    worker_id: String,
}

impl JobProcessor {
    pub fn new(
        queue: Arc<JobQueue>,
        executor: Arc<JobExecutor>,
        tracker: Arc<dyn TaskTracker>,
        callbacks: CallbackNotifier,
        config: WorkerConfig,
        worker_id: String,
    ) -> Self {
        Self {
            queue,
            executor,
            tracker,
            callbacks,
            config,
            worker_id,
        }
    }

    /// Run until the cancel signal flips to `true`.
    ///
    /// Cancellation is observed between tasks; a task in progress runs to
    /// completion.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            worker_id = %self.worker_id,
            poll_interval_seconds = self.config.poll_interval_seconds,
            max_task_attempts = self.config.max_task_attempts,
            "Job processor started"
        );

        let poll_interval = Duration::from_secs(self.config.poll_interval_seconds);

        loop {
            if *cancel.borrow() {
                break;
            }

            if self.run_once().await == IterationOutcome::Idle {
                tokio::select! {
                    changed = cancel.changed() => {
                        if changed.is_err() {
                            warn!(worker_id = %self.worker_id, "Shutdown channel closed");
                            break;
                        }
                    }
                    _ = time::sleep(poll_interval) => {}
                }
            }
        }

        info!(worker_id = %self.worker_id, "Job processor stopped");
    }

    /// Dequeue and settle at most one task.
    pub async fn run_once(&self) -> IterationOutcome {
        let (kind, task) = match self.queue.dequeue().await {
            Ok(Some(claimed)) => claimed,
            Ok(None) => return IterationOutcome::Idle,
            Err(e) => {
                error!(worker_id = %self.worker_id, error = %e, "Failed to dequeue task");
                return IterationOutcome::Idle;
            }
        };

        let outcome = self.process_task(kind, &task).await;

        if let Err(e) = self.tracker.notify(&task.id).await {
            warn!(task_id = %task.id, error = %e, "Failed to notify job tracker");
        }

        outcome
    }

    async fn process_task(&self, kind: JobKind, task: &Task) -> IterationOutcome {
        let job = match self.queue.get_job(&task.job_id).await {
            Ok(job) => job,
            Err(e) => {
                error!(task_id = %task.id, job_id = %task.job_id, error = %e, "Failed to fetch job");
                return self.reject(None, task, JobExecutionError::from(e)).await;
            }
        };

        info!(
            job_id = %job.id,
            task_id = %task.id,
            job_type = %job.job_type,
            attempts = task.attempts,
            "Processing task"
        );

        match self.execute(kind, &job, task).await {
            Ok(outcome) => self.complete(&job, task, outcome).await,
            Err(err) => self.reject(Some(&job), task, err).await,
        }
    }

    async fn execute(&self, kind: JobKind, job: &Job, task: &Task) -> Result<JobOutcome, JobExecutionError> {
        let max = self.config.max_task_attempts;
        if task.attempts >= max {
            return Err(UnrecoverableTaskError::MaxAttemptsReached {
                attempts: task.attempts,
                max,
            }
            .into());
        }
        self.executor.execute(kind, job, task).await
    }

    async fn complete(&self, job: &Job, task: &Task, outcome: JobOutcome) -> IterationOutcome {
        if let Err(e) = self.queue.ack(&job.id, &task.id).await {
            error!(job_id = %job.id, task_id = %task.id, error = %e, "Failed to acknowledge task");
        }
        info!(
            job_id = %job.id,
            task_id = %task.id,
            report = outcome.report.is_some(),
            "Task completed"
        );

        self.callbacks
            .notify(job, task, CallbackStatus::Completed, outcome.report_url(), None)
            .await;

        IterationOutcome::Completed {
            task_id: task.id.clone(),
        }
    }

    async fn reject(&self, job: Option<&Job>, task: &Task, err: JobExecutionError) -> IterationOutcome {
        let resettable = err.is_resettable();
        let message = err.to_string();

        if resettable {
            warn!(task_id = %task.id, job_id = %task.job_id, error = %message, "Task failed, will be retried");
        } else {
            error!(task_id = %task.id, job_id = %task.job_id, error = %message, "Task failed permanently");
        }

        if let Err(e) = self
            .queue
            .reject(&task.job_id, &task.id, resettable, &message)
            .await
        {
            error!(task_id = %task.id, error = %e, "Failed to reject task");
        }

        if let Some(job) = job {
            self.callbacks
                .notify(job, task, CallbackStatus::Failed, None, Some(message))
                .await;
        }

        IterationOutcome::Rejected {
            task_id: task.id.clone(),
            resettable,
        }
    }
}
