//! Validation findings collected per feature.

pub mod category;
pub mod error;
pub mod service;
pub mod thresholds;

pub use category::{AggregatedCounts, ErrorCategory, ErrorsCount};
pub use error::{InvalidFeature, ValidationError};
pub use service::{PartValidationResult, ValidationErrorCode, ValidationRequest, ValidationResponse};
pub use thresholds::{SmallHolesStatus, ThresholdStatus, ThresholdsResult};
