//! Client for the viral prompts catalogue.
//!
//! A fetch runs transport → preprocess → classify → parse → normalize
//! ([`client::PromptClient`]). Good results go to a single-slot cache
//! ([`cache::PromptCache`]). [`coordinator::PromptsCoordinator`] ties the
//! two together and serves stale data when a fetch fails.

pub mod cache;
pub mod catalogue;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ingest;
pub mod likes;
pub mod models;
pub mod relay;
pub mod storage;
pub mod transport;

pub use crate::error::{FetchError, FetchErrorKind};
pub use crate::models::{Prompt, PromptCollection};
