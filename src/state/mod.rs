//! Durable posting state.
//!
//! One JSON snapshot holds both the caption rotation point and the dedup
//! ledger, so a single atomic write (and a single remote object) covers
//! everything that must survive between runs. Backends implement
//! [`StateStore`]; the orchestrator never knows which one is active.

mod file;
mod ledger;
mod memory;
mod remote;

pub use file::FileStore;
pub use ledger::DedupLedger;
pub use memory::MemoryStore;
pub use remote::RemoteStore;

use serde::{Deserialize, Serialize};

/// Caption rotation point and the running post counter.
///
/// The counter increases by exactly one per successful run and never goes
/// backwards; the index always points at the next caption to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostingState {
    #[serde(default)]
    pub caption_index: usize,
    #[serde(default)]
    pub post_counter: u64,
}

/// Everything the state store persists, as one unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub posting: PostingState,
    #[serde(default)]
    pub used_images: DedupLedger,
}

/// Persistence seam for the posting state.
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Load the persisted snapshot. Absence is not an error: a missing or
    /// unreadable record yields the defaults (first run), with a warning.
    async fn load(&mut self) -> StateSnapshot;

    /// Persist the snapshot. A reader after `save` sees either the old or
    /// the new snapshot in full, never a partial mix.
    async fn save(&mut self, snapshot: &StateSnapshot) -> anyhow::Result<()>;
}

/// Backend selected at startup from configuration.
pub enum Store {
    File(FileStore),
    Remote(RemoteStore),
}

impl StateStore for Store {
    async fn load(&mut self) -> StateSnapshot {
        match self {
            Store::File(s) => s.load().await,
            Store::Remote(s) => s.load().await,
        }
    }

    async fn save(&mut self, snapshot: &StateSnapshot) -> anyhow::Result<()> {
        match self {
            Store::File(s) => s.save(snapshot).await,
            Store::Remote(s) => s.save(snapshot).await,
        }
    }
}
