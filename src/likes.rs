use crate::storage::KeyValueStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, warn};

pub const LIKED_PROMPTS_KEY: &str = "viralprompts_liked";

/// Set of liked prompts, keyed by `urlTitle` so likes survive upstream id
/// reassignment.
pub struct LikedPrompts {
    store: Arc<dyn KeyValueStore>,
    liked: BTreeSet<String>,
}

impl LikedPrompts {
    /// Loads the persisted set. Unreadable or malformed data starts empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let liked = match store.get(LIKED_PROMPTS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(slugs) => slugs.into_iter().collect(),
                Err(e) => {
                    warn!(error = %e, "Ignoring malformed liked prompts");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                error!(error = %e, "Error reading liked prompts from storage");
                BTreeSet::new()
            }
        };
        Self { store, liked }
    }

    pub fn is_liked(&self, url_title: &str) -> bool {
        self.liked.contains(url_title)
    }

    /// Flips the like state and persists it. Returns whether the prompt is
    /// now liked.
    pub async fn toggle(&mut self, url_title: &str) -> bool {
        let now_liked = if self.liked.remove(url_title) {
            false
        } else {
            self.liked.insert(url_title.to_string());
            true
        };
        self.persist().await;
        now_liked
    }

    pub fn count(&self) -> usize {
        self.liked.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.liked.iter().map(String::as_str)
    }

    async fn persist(&self) {
        let slugs: Vec<&str> = self.iter().collect();
        let serialized = match serde_json::to_string(&slugs) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Error serializing liked prompts");
                return;
            }
        };
        if let Err(e) = self.store.set(LIKED_PROMPTS_KEY, &serialized).await {
            error!(error = %e, "Error saving liked prompts to storage");
        }
    }
}
