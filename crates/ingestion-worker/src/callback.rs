//! Callback fan-out to a job's subscribers.

use std::sync::Arc;

use tracing::{debug, warn};

use ingestion_client::CallbackSender;
use ingestion_entity::callback::CallbackPayload;
use ingestion_entity::job::Job;
use ingestion_entity::task::{CallbackStatus, Task};

/// Posts the task outcome to every callback URL of the job.
///
/// Delivery failures are logged and never change the task outcome.
#[derive(Clone)]
pub struct CallbackNotifier {
    sender: Arc<dyn CallbackSender>,
}

impl CallbackNotifier {
    pub fn new(sender: Arc<dyn CallbackSender>) -> Self {
        Self { sender }
    }

    pub async fn notify(
        &self,
        job: &Job,
        task: &Task,
        status: CallbackStatus,
        report_url: Option<String>,
        message: Option<String>,
    ) {
        if !job.has_callbacks() {
            return;
        }

        let payload = CallbackPayload {
            report_url,
            message,
            ..CallbackPayload::for_task(job, task, status)
        };

        for url in &job.parameters.callback_urls {
            match self.sender.send(url, &payload).await {
                Ok(()) => debug!(job_id = %job.id, task_id = %task.id, url = %url, "Callback sent"),
                Err(e) => warn!(
                    job_id = %job.id,
                    task_id = %task.id,
                    url = %url,
                    error = %e,
                    "Failed to send callback"
                ),
            }
        }
    }
}
