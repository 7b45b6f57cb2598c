//! State Store Error Types

use thiserror::Error;

/// State store errors. Backend failures are transient: callers retry with
/// backoff rather than cancel, since a half-applied windowing update would
/// leave per-user state inconsistent.
#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("State store backend failure: {0}")]
    Backend(String),
}
