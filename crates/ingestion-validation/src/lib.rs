//! # ingestion-validation
//!
//! Everything that happens to a chunk's features between reading and
//! reporting:
//!
//! - [`mapping`] checks each feature's attributes and geometry and maps it
//!   to the polygon part shape the validation service expects.
//! - [`aggregator::ErrorAggregator`] collects findings per feature, counts
//!   them per category and evaluates the percentage thresholds.
//! - [`report::ReportBuilder`] appends flagged features to a job-scoped
//!   layer and finalizes it into a zip with a metadata side-file.

pub mod aggregator;
pub mod mapping;
pub mod report;

pub use aggregator::{AggregationStatistics, ErrorAggregator, ErrorSummary};
pub use mapping::{MappingContext, validate_and_map};
pub use report::{FinalizeParams, ReportBuilder, ReportError};
