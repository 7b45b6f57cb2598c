//! Payload Decoding

use crate::error::DecodeError;
use crate::transaction::Transaction;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// Loosely-typed mirror of the wire payload, so a single bad field is
/// reported by name instead of failing the whole deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransaction {
    id: Option<String>,
    user_id: Option<String>,
    amount: Option<Value>,
    currency: Option<String>,
    location: Option<String>,
    timestamp: Option<Value>,
}

/// Decode and validate one transaction payload.
///
/// Failures are isolated to the record: the caller decides whether to
/// skip, dead-letter, or retry.
pub fn decode_transaction(payload: &[u8]) -> Result<Transaction, DecodeError> {
    let raw: RawTransaction =
        serde_json::from_slice(payload).map_err(|e| DecodeError::Json(e.to_string()))?;

    let id = require(raw.id, "id")?;
    let user_id = require(raw.user_id, "userId")?;
    let currency = require(raw.currency, "currency")?;
    let location = require(raw.location, "location")?;

    let amount = raw
        .amount
        .as_ref()
        .ok_or(DecodeError::MissingField("amount"))
        .and_then(parse_amount)?;

    let timestamp = raw
        .timestamp
        .as_ref()
        .ok_or(DecodeError::MissingField("timestamp"))
        .and_then(parse_timestamp)?;

    Ok(Transaction {
        id,
        user_id,
        amount,
        currency,
        location,
        timestamp,
    })
}

fn require(field: Option<String>, name: &'static str) -> Result<String, DecodeError> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(DecodeError::MissingField(name)),
    }
}

/// Parse an amount from a JSON number or numeric string.
pub fn parse_amount(value: &Value) -> Result<Decimal, DecodeError> {
    match value {
        Value::Number(n) => {
            let f = n
                .as_f64()
                .ok_or_else(|| DecodeError::InvalidAmount(n.to_string()))?;
            Decimal::try_from(f).map_err(|_| DecodeError::InvalidAmount(n.to_string()))
        }
        Value::String(s) => {
            Decimal::from_str(s).map_err(|_| DecodeError::InvalidAmount(s.clone()))
        }
        other => Err(DecodeError::InvalidAmount(other.to_string())),
    }
}

/// Parse an RFC 3339 timestamp string or epoch-milliseconds number.
fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, DecodeError> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| DecodeError::InvalidTimestamp(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .ok_or_else(|| DecodeError::InvalidTimestamp(n.to_string())),
        other => Err(DecodeError::InvalidTimestamp(other.to_string())),
    }
}
