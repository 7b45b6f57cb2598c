//! Transaction Decoding and Validation
//!
//! Provides the transaction wire type plus payload decoding with
//! field-level validation.

mod decode;
mod error;
mod transaction;

pub use decode::{decode_transaction, parse_amount};
pub use error::DecodeError;
pub use transaction::Transaction;
