//! Ingestion job kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The flavour of ingestion a job requests.
///
/// The queue addresses each kind by a configured job-type string; the
/// kind itself is what handlers register against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// First ingestion of a product.
    New,
    /// Additive update of an existing product.
    Update,
    /// Update that replaces the product's previous parts.
    SwapUpdate,
}

impl JobKind {
    /// All kinds in their polling order.
    pub const ALL: [JobKind; 3] = [Self::New, Self::Update, Self::SwapUpdate];

    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Update => "update",
            Self::SwapUpdate => "swap_update",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
