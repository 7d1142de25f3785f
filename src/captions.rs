//! Caption list and the rotating caption cycle.
//!
//! Captions live in a JSON document (`{"captions": [...]}`) loaded once per
//! run. Selection is a pure function of the current posting state: the next
//! caption is always the one at `caption_index`, and the index advances
//! cyclically so every caption is used exactly once per full rotation.

use crate::error::Result;
use crate::state::PostingState;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CaptionsFile {
    #[serde(default)]
    captions: Vec<String>,
}

/// Immutable, ordered caption list.
#[derive(Debug, Clone)]
pub struct Captions {
    entries: Vec<String>,
}

impl Captions {
    /// Load captions from a JSON file. A malformed or missing file is a
    /// fatal configuration problem; an empty list is not (the run skips
    /// cleanly instead).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: CaptionsFile = serde_json::from_str(&raw)?;
        Ok(Self {
            entries: parsed.captions,
        })
    }

    #[allow(dead_code)]
    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Advance the caption cycle: bump the post counter, pick the caption at
    /// the current index and move the index forward (wrapping).
    ///
    /// Returns the formatted caption `"#{counter} {caption} "` (the trailing
    /// space is part of the posting format) together with the advanced state.
    /// Pure: the caller decides when, if ever, the new state is persisted.
    ///
    /// Must not be called with an empty caption list.
    pub fn next(&self, state: &PostingState) -> (String, PostingState) {
        debug_assert!(!self.entries.is_empty());

        // A stored index can be stale if the caption list shrank between runs.
        let index = state.caption_index % self.entries.len();
        let counter = state.post_counter + 1;

        let formatted = format!("#{} {} ", counter, self.entries[index]);
        let advanced = PostingState {
            caption_index: (index + 1) % self.entries.len(),
            post_counter: counter,
        };

        (formatted, advanced)
    }
}
