use crate::models::{CacheEntry, PromptCollection};
use crate::storage::KeyValueStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CACHE_KEY: &str = "viralprompts_cache_v1";

/// Last good feed, persisted in a single storage slot.
///
/// Only normalized collections are written here, so reads do not
/// re-validate records. Everything except [`PromptCache::clear`] swallows
/// storage faults.
#[derive(Clone)]
pub struct PromptCache {
    store: Arc<dyn KeyValueStore>,
}

impl PromptCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn read(&self) -> Option<PromptCollection> {
        self.read_entry().await.map(|entry| entry.data)
    }

    /// The cached collection together with the time it was written.
    pub async fn read_entry(&self) -> Option<CacheEntry> {
        let raw = match self.store.get(CACHE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Error reading cache");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed cache entry");
                None
            }
        }
    }

    pub async fn write(&self, data: &PromptCollection) {
        let entry = CacheEntry::new(data.clone());
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Error serializing cache entry");
                return;
            }
        };
        match self.store.set(CACHE_KEY, &serialized).await {
            Ok(()) => debug!(count = data.len(), "Cached prompt feed"),
            Err(e) => warn!(error = %e, "Error writing cache"),
        }
    }

    /// True when an entry is stored. Storage faults read as "no cache".
    pub async fn exists(&self) -> bool {
        matches!(self.store.get(CACHE_KEY).await, Ok(Some(_)))
    }

    /// Removes the cached entry. Unlike the other operations this reports
    /// storage faults, since the caller asked for it explicitly.
    pub async fn clear(&self) -> Result<()> {
        self.store
            .remove(CACHE_KEY)
            .await
            .context("Failed to clear prompt cache")?;
        info!("Cache cleared successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Prompt;
    use crate::storage::{FileSystemStore, MemoryStore};
    use tempfile::tempdir;

    fn sample() -> PromptCollection {
        let mut first = Prompt::new("A", "a", "a", 1.0);
        first.categories = Some(vec!["art".into()]);
        first.copied_count = Some(10.0);
        PromptCollection {
            prompts: vec![first, Prompt::new("B", "b", "b", 2.0)],
        }
    }

    #[tokio::test]
    async fn write_then_read() {
        let cache = PromptCache::new(Arc::new(MemoryStore::new()));
        assert!(!cache.exists().await);
        assert_eq!(cache.read().await, None);

        cache.write(&sample()).await;
        assert!(cache.exists().await);
        assert_eq!(cache.read().await, Some(sample()));
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let cache = PromptCache::new(Arc::new(MemoryStore::new()));
        cache.write(&sample()).await;
        cache.clear().await.unwrap();
        assert!(!cache.exists().await);
        assert_eq!(cache.read().await, None);
    }

    #[tokio::test]
    async fn storage_faults_degrade_to_no_cache() {
        let store = Arc::new(MemoryStore::new());
        let cache = PromptCache::new(store.clone());
        cache.write(&sample()).await;

        store.fail_all(true);
        assert_eq!(cache.read().await, None);
        assert!(!cache.exists().await);
        cache.write(&sample()).await; // logged, not propagated
        assert!(cache.clear().await.is_err());

        store.fail_all(false);
        assert_eq!(cache.read().await, Some(sample()));
    }

    #[tokio::test]
    async fn malformed_entry_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        let cache = PromptCache::new(store.clone());

        for raw in [
            "not json",
            r#"{"data":{"prompts":{}},"timestamp":"2024-01-01T00:00:00Z"}"#,
            r#"{"data":{}}"#,
        ] {
            store.set(CACHE_KEY, raw).await.unwrap();
            assert_eq!(cache.read().await, None, "{}", raw);
        }
    }

    #[tokio::test]
    async fn survives_reopen_on_disk() {
        let dir = tempdir().unwrap();
        PromptCache::new(Arc::new(FileSystemStore::new(dir.path())))
            .write(&sample())
            .await;

        let reopened = PromptCache::new(Arc::new(FileSystemStore::new(dir.path())));
        let entry = reopened.read_entry().await.unwrap();
        assert_eq!(entry.data, sample());
        assert!(entry.timestamp <= chrono::Utc::now());
    }
}
