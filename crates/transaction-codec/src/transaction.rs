//! Transaction Wire Type

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single financial transaction as carried on the wire.
///
/// `id` is assigned by the producer and globally unique; it is part of the
/// wire contract but not consulted by the rule logic. Amounts travel as
/// JSON numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
}
