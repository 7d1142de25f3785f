//! Remote-sync wrapper around the file backend.
//!
//! For execution environments whose local disk is wiped between runs: the
//! remote object is the source of truth, the local file is only a cache
//! valid within one run. Every `load` pulls the blob down first and every
//! `save` pushes it back up.

use super::{FileStore, StateSnapshot, StateStore};
use anyhow::{Context, Result};
use storage_client::StorageClient;
use tracing::{info, warn};

/// Remote side of the sync layer. Implemented by the storage client; tests
/// substitute a fake.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Fetch the blob at `path`. `Ok(None)` means the object does not exist.
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Store the blob at `path`, replacing any existing object.
    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<()>;
}

impl ObjectStore for StorageClient {
    async fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
        Ok(StorageClient::download(self, path).await?)
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<()> {
        Ok(StorageClient::upload(self, path, data).await?)
    }
}

pub struct RemoteStore<C = StorageClient> {
    inner: FileStore,
    client: C,
    object_path: String,
}

impl<C: ObjectStore> RemoteStore<C> {
    pub fn new(inner: FileStore, client: C, object_path: impl Into<String>) -> Self {
        Self {
            inner,
            client,
            object_path: object_path.into(),
        }
    }

    /// Pull the state blob from the remote store, best effort. A missing
    /// object or a download failure means "start fresh" and is never fatal.
    async fn sync_down(&self) {
        match self.client.download(&self.object_path).await {
            Ok(Some(data)) => match self.inner.replace_contents(&data) {
                Ok(()) => info!("✅ Downloaded state from remote store"),
                Err(e) => warn!("⚠️ Failed to write downloaded state locally: {}", e),
            },
            Ok(None) => {
                warn!(
                    "⚠️ No remote state object at '{}', starting fresh",
                    self.object_path
                );
            }
            Err(e) => {
                warn!("⚠️ Failed to download remote state: {:#}, starting fresh", e);
            }
        }
    }

    async fn sync_up(&self) -> Result<()> {
        let data = self
            .inner
            .contents()
            .context("Failed to read local state for upload")?;

        self.client
            .upload(&self.object_path, data)
            .await
            .context("Failed to upload state to remote store")?;

        info!("✅ Uploaded state to remote store");
        Ok(())
    }
}

impl<C: ObjectStore> StateStore for RemoteStore<C> {
    async fn load(&mut self) -> StateSnapshot {
        self.sync_down().await;
        self.inner.load().await
    }

    async fn save(&mut self, snapshot: &StateSnapshot) -> Result<()> {
        self.inner.save(snapshot).await?;
        self.sync_up().await
    }
}
