//! # ingestion-storage
//!
//! Publishes finalized validation reports. The local filesystem provider
//! serves reports from the reports root; the S3 provider (feature `s3`)
//! uploads them to a bucket.

pub mod providers;
pub mod publisher;

pub use publisher::ReportPublisher;
