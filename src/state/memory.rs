//! In-memory backend, used by tests and available as a null store.

use super::{StateSnapshot, StateStore};
use anyhow::Result;

#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct MemoryStore {
    snapshot: Option<StateSnapshot>,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    /// The last saved snapshot, if any.
    pub fn current(&self) -> Option<&StateSnapshot> {
        self.snapshot.as_ref()
    }
}

impl StateStore for MemoryStore {
    async fn load(&mut self) -> StateSnapshot {
        self.snapshot.clone().unwrap_or_default()
    }

    async fn save(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}
