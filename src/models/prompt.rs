use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated prompt from the viral prompts feed.
///
/// Instances only come out of the sanitizer (or a cache entry written from
/// sanitizer output), so `title`, `prompt` and `url_title` are always
/// non-empty and `id` is always finite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>, // relative path on the site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub how_to_use: Option<String>, // newline separated steps
    /// Slug; the identity used for likes across sessions.
    pub url_title: String,
    pub id: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copied_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
}

impl Prompt {
    pub fn new(
        title: impl Into<String>,
        prompt: impl Into<String>,
        url_title: impl Into<String>,
        id: f64,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            prompt: prompt.into(),
            image: None,
            categories: None,
            how_to_use: None,
            url_title: url_title.into(),
            id,
            copied_count: None,
            created_date: None,
        }
    }

    pub fn categories(&self) -> &[String] {
        self.categories.as_deref().unwrap_or_default()
    }
}

/// The `{ "prompts": [...] }` envelope. Non-empty once normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PromptCollection {
    pub prompts: Vec<Prompt>,
}

impl PromptCollection {
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// What the cache persists: the collection and when it was fetched, stored
/// together so readers never observe one without the other.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    pub data: PromptCollection,
    pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: PromptCollection) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }
}
