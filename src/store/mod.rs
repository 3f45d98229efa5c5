//! Roster persistence

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Store;

/// Durable backing for the roster document.
///
/// `load` re-reads the backing storage every call and callers never hold
/// a `Store` across requests, so the durable copy is the single source
/// of truth; the cost is a full read and parse per request.
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Current roster state. Implementations that seed on first load
    /// must persist the synthesized state before returning it.
    async fn load(&self) -> Result<Store>;

    /// Fully overwrite the backing storage with the serialized store.
    ///
    /// Failure is fatal for the in-flight request; callers must not
    /// assume partial success.
    async fn save(&self, store: &Store) -> Result<()>;
}
