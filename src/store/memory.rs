//! In-memory roster store, used by tests

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::store::RosterStore;
use crate::types::Store;

/// Roster store holding the document in memory. `load` hands out a
/// clone, so it behaves like the file-backed store minus the disk.
pub struct MemoryStore {
    inner: Mutex<Store>,
}

impl MemoryStore {
    pub fn new(initial: Store) -> Self {
        Self {
            inner: Mutex::new(initial),
        }
    }
}

#[async_trait]
impl RosterStore for MemoryStore {
    async fn load(&self) -> Result<Store> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, store: &Store) -> Result<()> {
        *self.inner.lock().await = store.clone();
        Ok(())
    }
}
