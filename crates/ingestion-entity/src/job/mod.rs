//! Ingestion job entities.

pub mod kind;
pub mod model;
pub mod parameters;

pub use kind::JobKind;
pub use model::Job;
pub use parameters::IngestionJobParameters;
