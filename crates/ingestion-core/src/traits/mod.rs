//! Core traits defined in `ingestion-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
