//! Checkpoint persistence seam for the chunked reader.

use std::sync::Mutex;

use async_trait::async_trait;
use ingestion_core::result::AppResult;
use ingestion_entity::task::ProcessingState;

/// Loads and stores the reader's position.
///
/// `save` is called once per chunk, after the chunk has been fully
/// processed, so a stored state always covers a contiguous prefix of the
/// file.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn load(&self) -> AppResult<Option<ProcessingState>>;

    async fn save(&self, state: &ProcessingState) -> AppResult<()>;
}

/// Keeps the checkpoint in memory.
#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    state: Mutex<Option<ProcessingState>>,
    saves: Mutex<Vec<ProcessingState>>,
}

impl MemoryCheckpointer {
    pub fn new(initial: Option<ProcessingState>) -> Self {
        Self {
            state: Mutex::new(initial),
            saves: Mutex::new(Vec::new()),
        }
    }

    /// Every state saved so far, oldest first.
    pub fn history(&self) -> Vec<ProcessingState> {
        self.saves.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Checkpointer for MemoryCheckpointer {
    async fn load(&self) -> AppResult<Option<ProcessingState>> {
        Ok(self.state.lock().map(|s| s.clone()).unwrap_or_default())
    }

    async fn save(&self, state: &ProcessingState) -> AppResult<()> {
        if let Ok(mut current) = self.state.lock() {
            *current = Some(state.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            saves.push(state.clone());
        }
        Ok(())
    }
}
