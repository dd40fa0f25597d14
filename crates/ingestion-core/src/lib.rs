//! # ingestion-core
//!
//! Core crate for the polygon parts ingestion worker. Contains the
//! configuration schemas, the unified error system, and the storage
//! provider trait used to publish validation reports.
//!
//! This crate has **no** internal dependencies on other ingestion crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
