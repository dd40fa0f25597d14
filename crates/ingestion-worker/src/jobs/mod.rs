//! Job handler implementations.

pub mod ingestion;

pub use ingestion::IngestionJobHandler;
