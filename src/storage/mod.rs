use anyhow::Result;
use async_trait::async_trait;

pub mod filesystem;
pub mod memory;
pub mod postgres;

pub use filesystem::FileSystemStore;
pub use memory::MemoryStore;

/// Trait defining the persistent key-value storage the client keeps its
/// cache and likes in.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static { // Ensure Send + Sync for Arc<dyn T>
    /// Returns the stored value, or `None` if the key was never set or was removed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores the value, replacing any previous one. Readers see either the
    /// old value or the new one, never a mix.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the key. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}
