//! # ingestion-entity
//!
//! Domain models shared by the ingestion worker crates. Jobs and tasks
//! mirror the job manager's wire format (camelCase JSON), features follow
//! GeoJSON, and the validation types describe what the error aggregator
//! collects per feature.

pub mod callback;
pub mod feature;
pub mod job;
pub mod report;
pub mod shapefile;
pub mod task;
pub mod validation;
