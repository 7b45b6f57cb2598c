//! Alert Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use transaction_codec::Transaction;

/// Why an alert was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertReason {
    LargeTransaction,
    HighFrequency,
    LocationChange,
}

impl AlertReason {
    /// Human-readable phrasing used in logs and notifications
    pub fn message(&self) -> &'static str {
        match self {
            AlertReason::LargeTransaction => "Large Transaction Detected",
            AlertReason::HighFrequency => "High Frequency Transactions Detected",
            AlertReason::LocationChange => "Unusual Location Change Detected",
        }
    }

    /// Stable snake_case label for metrics
    pub fn label(&self) -> &'static str {
        match self {
            AlertReason::LargeTransaction => "large_transaction",
            AlertReason::HighFrequency => "high_frequency",
            AlertReason::LocationChange => "location_change",
        }
    }
}

impl fmt::Display for AlertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A suspected-fraud signal. Immutable and terminal once published:
/// downstream consumers do not mutate or deduplicate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub user_id: String,
    pub reason: AlertReason,
    pub transaction: Transaction,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    /// Build an alert for the offending transaction, stamped now
    pub fn new(reason: AlertReason, transaction: &Transaction) -> Self {
        Self {
            user_id: transaction.user_id.clone(),
            reason,
            transaction: transaction.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_messages() {
        assert_eq!(
            AlertReason::LargeTransaction.to_string(),
            "Large Transaction Detected"
        );
        assert_eq!(
            AlertReason::HighFrequency.to_string(),
            "High Frequency Transactions Detected"
        );
        assert_eq!(
            AlertReason::LocationChange.to_string(),
            "Unusual Location Change Detected"
        );
    }

    #[test]
    fn test_reason_serializes_by_variant_name() {
        let json = serde_json::to_value(AlertReason::HighFrequency).unwrap();
        assert_eq!(json, serde_json::json!("HighFrequency"));
    }
}
