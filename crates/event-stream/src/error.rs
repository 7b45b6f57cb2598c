//! Stream Error Types

use thiserror::Error;

/// Transport error types
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
