//! Stateful front of the pipeline: what the display layer talks to.
//!
//! The coordinator serves whatever collection it has (cached or fetched)
//! and refreshes it in the background. On failure it keeps the last good
//! data on screen when a cache exists.

use crate::cache::PromptCache;
use crate::client::PromptClient;
use crate::error::FetchError;
use crate::models::{Prompt, PromptCollection};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Extra attempts per refresh after the first one fails.
    pub retries: u32,
    /// Age after which data is refreshed in the background on access.
    pub stale_after: Duration,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    IdleWithCache,
    IdleEmpty,
    Loading,
    Success,
    ErrorWithFallback,
    ErrorNoFallback,
}

/// Point-in-time view of the coordinator for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: QueryStatus,
    pub prompts: Vec<Prompt>,
    pub is_loading: bool,
    pub is_error: bool,
    pub error: Option<FetchError>,
    pub is_refetching: bool,
    pub is_using_cache: bool,
    pub has_cached_data: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn find(&self, url_title: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.url_title == url_title)
    }
}

#[derive(Debug)]
struct QueryState {
    status: QueryStatus,
    data: Option<PromptCollection>,
    error: Option<FetchError>,
    fetching: bool,
    updated_at: Option<DateTime<Utc>>,
    has_cached_data: bool,
}

impl QueryState {
    fn empty(has_cached_data: bool) -> Self {
        Self {
            status: QueryStatus::IdleEmpty,
            data: None,
            error: None,
            fetching: false,
            updated_at: None,
            has_cached_data,
        }
    }

    fn snapshot(&self) -> Snapshot {
        let has_data = self.data.is_some();
        Snapshot {
            status: self.status,
            prompts: self.data.as_ref().map(|d| d.prompts.clone()).unwrap_or_default(),
            is_loading: self.fetching && !has_data,
            is_error: matches!(
                self.status,
                QueryStatus::ErrorWithFallback | QueryStatus::ErrorNoFallback
            ),
            error: self.error.clone(),
            is_refetching: self.fetching && has_data,
            is_using_cache: self.status == QueryStatus::ErrorWithFallback,
            has_cached_data: self.has_cached_data,
            updated_at: self.updated_at,
        }
    }
}

pub struct PromptsCoordinator {
    client: PromptClient,
    cache: PromptCache,
    options: CoordinatorOptions,
    state: Mutex<QueryState>,
    // Held for the duration of a refresh; at most one fetch runs at a time.
    in_flight: tokio::sync::Mutex<()>,
    completed_refreshes: AtomicU64,
    background_pending: AtomicBool,
}

impl PromptsCoordinator {
    /// Builds a coordinator seeded from the cache. Cached data is served
    /// from the first snapshot on; no fetch is started here.
    pub async fn bootstrap(
        client: PromptClient,
        cache: PromptCache,
        options: CoordinatorOptions,
    ) -> Self {
        let state = match cache.read_entry().await {
            Some(entry) => {
                info!(
                    count = entry.data.len(),
                    cached_at = %entry.timestamp,
                    "Bootstrapped from cache"
                );
                QueryState {
                    status: QueryStatus::IdleWithCache,
                    data: Some(entry.data),
                    error: None,
                    fetching: false,
                    updated_at: Some(entry.timestamp),
                    has_cached_data: true,
                }
            }
            None => QueryState::empty(cache.exists().await),
        };

        Self {
            client,
            cache,
            options,
            state: Mutex::new(state),
            in_flight: tokio::sync::Mutex::new(()),
            completed_refreshes: AtomicU64::new(0),
            background_pending: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, QueryState> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state().snapshot()
    }

    pub fn status(&self) -> QueryStatus {
        self.state().status
    }

    /// True when there is no data yet or it is older than the freshness window.
    pub fn is_stale(&self) -> bool {
        let updated_at = self.state().updated_at;
        match updated_at {
            None => true,
            Some(at) => {
                let age = Utc::now().signed_duration_since(at);
                age.to_std().map_or(false, |age| age >= self.options.stale_after)
            }
        }
    }

    /// Returns the current snapshot without waiting. Stale data triggers a
    /// background refresh; must be called from within a tokio runtime.
    pub fn access(self: &Arc<Self>) -> Snapshot {
        let snapshot = self.snapshot();
        if self.is_stale()
            && self
                .background_pending
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            debug!("Data is stale, refreshing in background");
            let this = Arc::clone(self);
            tokio::spawn(async move {
                this.refresh().await;
                this.background_pending.store(false, Ordering::Release);
            });
        }
        snapshot
    }

    /// Fetches the feed, retrying up to `retries` extra times. A call made
    /// while another refresh is running waits for it and returns its
    /// outcome rather than fetching again.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Snapshot {
        let seen = self.completed_refreshes.load(Ordering::Acquire);
        let _guard = self.in_flight.lock().await;
        if self.completed_refreshes.load(Ordering::Acquire) != seen {
            debug!("Refresh coalesced with the one already in flight");
            return self.snapshot();
        }
        self.run_refresh().await;
        self.completed_refreshes.fetch_add(1, Ordering::AcqRel);
        self.snapshot()
    }

    /// Clears the persistent cache and the served data, then refreshes from
    /// an empty state. A failed clear is returned and leaves state untouched.
    #[instrument(skip(self))]
    pub async fn clear_cache_and_refresh(&self) -> Result<Snapshot> {
        let _guard = self.in_flight.lock().await;
        if let Err(e) = self.cache.clear().await {
            error!(error = %e, "Error clearing cache");
            return Err(e);
        }
        *self.state() = QueryState::empty(false);

        self.run_refresh().await;
        self.completed_refreshes.fetch_add(1, Ordering::AcqRel);
        Ok(self.snapshot())
    }

    async fn run_refresh(&self) {
        let current = {
            let mut state = self.state();
            state.fetching = true;
            if state.data.is_none() {
                state.status = QueryStatus::Loading;
            }
            state.data.clone()
        };

        match self.fetch_with_retries().await {
            Ok(collection) => {
                // Cache first: success is only reported once the write is done.
                self.cache.write(&collection).await;
                let has_cached_data = self.cache.exists().await;
                let mut state = self.state();
                info!(count = collection.len(), "Prompts refreshed");
                state.status = QueryStatus::Success;
                state.data = Some(collection);
                state.error = None;
                state.fetching = false;
                state.updated_at = Some(Utc::now());
                state.has_cached_data = has_cached_data;
            }
            Err(err) => {
                let has_cached_data = self.cache.exists().await;
                let fallback = match (has_cached_data, current) {
                    (false, _) => None,
                    (true, Some(current)) => Some(current),
                    (true, None) => self.cache.read().await,
                };

                let mut state = self.state();
                state.fetching = false;
                state.has_cached_data = has_cached_data;
                match fallback {
                    Some(data) => {
                        warn!(
                            kind = %err.kind,
                            error = %err,
                            "Using cached data due to fetch error"
                        );
                        state.status = QueryStatus::ErrorWithFallback;
                        state.data = Some(data);
                    }
                    None => {
                        error!(
                            kind = %err.kind,
                            error = %err,
                            "Fetch failed with no cached fallback"
                        );
                        state.status = QueryStatus::ErrorNoFallback;
                        state.data = None;
                    }
                }
                state.error = Some(err);
            }
        }
    }

    async fn fetch_with_retries(&self) -> Result<PromptCollection, FetchError> {
        let mut attempt = 0;
        loop {
            match self.client.fetch_and_validate().await {
                Ok(collection) => return Ok(collection),
                Err(err) if attempt < self.options.retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        retries = self.options.retries,
                        kind = %err.kind,
                        "Fetch failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }
}
