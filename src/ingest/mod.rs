//! Pure text/JSON stages of a fetch: preprocess, classify, sanitize, normalize.

pub mod classify;
pub mod preprocess;
pub mod sanitize;

pub use classify::{classify, BlockReason, Classification};
pub use preprocess::preprocess;
pub use sanitize::{normalize, sanitize};
