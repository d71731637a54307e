pub mod prompt;

pub use prompt::{CacheEntry, Prompt, PromptCollection};
