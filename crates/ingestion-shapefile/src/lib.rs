//! # ingestion-shapefile
//!
//! Reads a shapefile as a sequence of chunks whose vertex count stays
//! within a configured budget. Progress is persisted through a
//! [`Checkpointer`](checkpoint::Checkpointer) after every chunk so an
//! interrupted task resumes at the next unprocessed feature.

pub mod checkpoint;
pub mod error;
pub mod metrics;
pub mod reader;
pub mod source;

pub use checkpoint::{Checkpointer, MemoryCheckpointer};
pub use error::ShapefileError;
pub use metrics::{MetricsSink, ReaderMetrics};
pub use reader::{ChunkProcessor, ChunkedReader, ReadSummary, ReaderOptions};
pub use source::{FeatureSource, MemoryFeatureSource, ShapefileSource};
