//! Task processing for the polygon parts worker.
//!
//! This crate provides:
//! - A job processor that polls the job manager and settles each task
//! - A job executor that dispatches tasks to the handler of their job kind
//! - The ingestion handler that validates a shapefile chunk by chunk and
//!   produces the validation report

pub mod callback;
pub mod executor;
pub mod jobs;
pub mod queue;
pub mod runner;

pub use executor::{JobExecutionError, JobExecutor, JobHandler, JobOutcome, UnrecoverableTaskError};
pub use jobs::IngestionJobHandler;
pub use queue::JobQueue;
pub use runner::{IterationOutcome, JobProcessor};
