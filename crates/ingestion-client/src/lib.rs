//! # ingestion-client
//!
//! Thin `reqwest` clients for the services the worker talks to. Each
//! client sits behind an `async_trait` so the worker can be driven by
//! in-memory fakes in tests.

pub mod callback;
pub mod error;
pub mod http;
pub mod job_manager;
pub mod polygon_parts;
pub mod tracker;

pub use callback::{CallbackSender, HttpCallbackSender};
pub use error::ClientError;
pub use job_manager::{JobManagerClient, JobStore};
pub use polygon_parts::{PartsValidationService, PolygonPartsClient};
pub use tracker::{JobTrackerClient, TaskTracker};
