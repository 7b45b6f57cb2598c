//! Rule Configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Rule thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Amount above which a transaction is flagged outright, regardless of
    /// currency
    pub large_amount_threshold: Decimal,

    /// Capacity of the per-user velocity window (recent timestamps kept)
    pub velocity_window: usize,

    /// Span below which a full velocity window raises an alert (ms)
    pub velocity_span_ms: i64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            large_amount_threshold: dec!(10000),
            velocity_window: 5,
            velocity_span_ms: 60_000,
        }
    }
}
