//! Task entities: the unit of work dequeued for a job.

pub mod model;
pub mod state;
pub mod status;

pub use model::{Task, TaskParameters, TaskUpdate};
pub use state::{ProcessingProgress, ProcessingState};
pub use status::{CallbackStatus, TaskStatus};
