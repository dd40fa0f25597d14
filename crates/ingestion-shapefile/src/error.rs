//! Shapefile decoding errors.

use ingestion_core::error::{AppError, ErrorKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShapefileError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid {kind} header in {path}: {reason}")]
    InvalidHeader {
        kind: &'static str,
        path: String,
        reason: String,
    },

    #[error("Record {record} is truncated")]
    Truncated { record: u64 },

    #[error("Unsupported shape type {0}")]
    UnsupportedShapeType(i32),
}

impl ShapefileError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<ShapefileError> for AppError {
    fn from(err: ShapefileError) -> Self {
        let kind = match &err {
            ShapefileError::Io { .. } => ErrorKind::Storage,
            _ => ErrorKind::Validation,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
