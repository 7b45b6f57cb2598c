//! Decode Error Types

use thiserror::Error;

/// Errors while decoding a transaction payload
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// Payload is not valid JSON or has the wrong shape
    #[error("Malformed transaction payload: {0}")]
    Json(String),

    /// Required field absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Amount is not a usable decimal number
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Timestamp could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
