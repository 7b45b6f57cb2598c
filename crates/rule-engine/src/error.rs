//! Engine Error Types

use state_store::StateStoreError;
use thiserror::Error;

/// Rule evaluation errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// The state update could not be durably applied. The whole evaluation
    /// fails without emitting alerts; the caller retries.
    #[error("State update failed: {0}")]
    Store(#[from] StateStoreError),
}
