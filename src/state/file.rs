//! Local file backend for the state store.

use super::{StateSnapshot, StateStore};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Stores the snapshot as JSON in a single local file.
///
/// Saves go through a sibling temp file followed by a rename, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, for the remote sync layer.
    pub(crate) fn contents(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    /// Atomically replace the file contents with a downloaded blob.
    pub(crate) fn replace_contents(&self, data: &[u8]) -> std::io::Result<()> {
        self.write_atomic(data)
    }

    fn write_atomic(&self, data: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)
    }
}

impl StateStore for FileStore {
    async fn load(&mut self) -> StateSnapshot {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "⚠️ No state found at {:?}. Initializing with caption_index=0, post_counter=0.",
                    self.path
                );
                return StateSnapshot::default();
            }
            Err(e) => {
                warn!("⚠️ Failed to read state file {:?}: {}", self.path, e);
                return StateSnapshot::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(
                    "⚠️ State file {:?} is not valid JSON ({}), starting fresh",
                    self.path, e
                );
                StateSnapshot::default()
            }
        }
    }

    async fn save(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot).context("Failed to serialize state")?;
        self.write_atomic(&json)
            .with_context(|| format!("Failed to write state file {:?}", self.path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PostingState;

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("state.json"));

        let mut snapshot = StateSnapshot {
            posting: PostingState {
                caption_index: 3,
                post_counter: 42,
            },
            ..Default::default()
        };
        snapshot
            .used_images
            .commit(["https://example.com/a.jpg".to_string()]);

        store.save(&snapshot).await.unwrap();
        assert_eq!(store.load().await, snapshot);
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("absent.json"));

        assert_eq!(store.load().await, StateSnapshot::default());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{{{not json").unwrap();

        let mut store = FileStore::new(path);
        assert_eq!(store.load().await, StateSnapshot::default());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_snapshot_in_full() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("state.json"));

        let first = StateSnapshot {
            posting: PostingState {
                caption_index: 1,
                post_counter: 1,
            },
            ..Default::default()
        };
        store.save(&first).await.unwrap();

        let second = StateSnapshot {
            posting: PostingState {
                caption_index: 2,
                post_counter: 2,
            },
            ..Default::default()
        };
        store.save(&second).await.unwrap();

        assert_eq!(store.load().await, second);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("nested/dir/state.json"));

        store.save(&StateSnapshot::default()).await.unwrap();
        assert!(store.path().exists());
    }
}
