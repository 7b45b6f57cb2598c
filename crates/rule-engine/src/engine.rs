//! Rule Evaluation

use crate::alert::{Alert, AlertReason};
use crate::config::RuleConfig;
use crate::error::EngineError;
use state_store::StateStore;
use std::sync::Arc;
use tracing::debug;
use transaction_codec::Transaction;

/// Streaming fraud-detection engine.
///
/// Stateless between invocations apart from data held in the injected
/// store, so one instance can be shared across partitioned workers. The
/// caller guarantees that evaluations for the same user never interleave.
pub struct FraudEngine {
    store: Arc<dyn StateStore>,
    config: RuleConfig,
}

impl FraudEngine {
    /// Create an engine over the given store and thresholds
    pub fn new(store: Arc<dyn StateStore>, config: RuleConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate one transaction and return the raised alerts (0 to 3).
    ///
    /// All three rules run unconditionally, in order. A state-store
    /// failure fails the whole evaluation with no alerts emitted, so a
    /// retry never observes a half-applied update paired with a published
    /// alert. Redelivered transactions are re-counted and can raise
    /// duplicate alerts.
    pub async fn evaluate(&self, txn: &Transaction) -> Result<Vec<Alert>, EngineError> {
        let mut alerts = Vec::new();

        // Rule 1: large transaction, a pure threshold on the amount
        if txn.amount > self.config.large_amount_threshold {
            debug!("Large transaction {} for user {}", txn.amount, txn.user_id);
            alerts.push(Alert::new(AlertReason::LargeTransaction, txn));
        }

        // Rule 2: high frequency over the post-insert velocity window.
        // The window includes the current transaction, so the rule can
        // only fire once `velocity_window` transactions are recorded.
        let window = self
            .store
            .push_and_trim(&txn.user_id, txn.timestamp, self.config.velocity_window)
            .await?;
        if window.len() >= self.config.velocity_window {
            if let (Some(newest), Some(oldest)) = (window.first(), window.last()) {
                let span_ms = newest.signed_duration_since(*oldest).num_milliseconds();
                if span_ms < self.config.velocity_span_ms {
                    debug!(
                        "High frequency for user {}: {} transactions in {}ms",
                        txn.user_id,
                        window.len(),
                        span_ms
                    );
                    alerts.push(Alert::new(AlertReason::HighFrequency, txn));
                }
            }
        }

        // Rule 3: location change against the last-known baseline.
        // The baseline is overwritten afterwards even when none existed,
        // so the first transaction only establishes it.
        let last = self.store.last_location(&txn.user_id).await?;
        if let Some(previous) = last {
            if previous != txn.location {
                debug!(
                    "Location change for user {}: {} -> {}",
                    txn.user_id, previous, txn.location
                );
                alerts.push(Alert::new(AlertReason::LocationChange, txn));
            }
        }
        self.store.set_location(&txn.user_id, &txn.location).await?;

        Ok(alerts)
    }

    /// Thresholds in effect
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use state_store::{MemoryStateStore, StateStoreError};

    fn txn(user: &str, amount: Decimal, location: &str, t_ms: i64) -> Transaction {
        Transaction {
            id: format!("{}-{}", user, t_ms),
            user_id: user.to_string(),
            amount,
            currency: "USD".to_string(),
            location: location.to_string(),
            timestamp: Utc.timestamp_millis_opt(t_ms).single().unwrap(),
        }
    }

    fn engine() -> FraudEngine {
        FraudEngine::new(
            Arc::new(MemoryStateStore::with_default_capacity()),
            RuleConfig::default(),
        )
    }

    fn reasons(alerts: &[Alert]) -> Vec<AlertReason> {
        alerts.iter().map(|a| a.reason).collect()
    }

    #[tokio::test]
    async fn test_large_transaction_strictly_above_threshold() {
        let engine = engine();

        let none = engine.evaluate(&txn("u1", dec!(10000), "NYC", 0)).await.unwrap();
        assert!(!reasons(&none).contains(&AlertReason::LargeTransaction));

        let fired = engine
            .evaluate(&txn("u2", dec!(10000.01), "NYC", 0))
            .await
            .unwrap();
        assert_eq!(reasons(&fired), vec![AlertReason::LargeTransaction]);
    }

    #[tokio::test]
    async fn test_high_frequency_needs_full_window() {
        let engine = engine();

        // Four rapid transactions never fire the velocity rule
        for i in 0..4 {
            let alerts = engine
                .evaluate(&txn("u1", dec!(50), "NYC", i * 1000))
                .await
                .unwrap();
            assert!(!reasons(&alerts).contains(&AlertReason::HighFrequency));
        }

        // The fifth lands inside a 4s span and fires
        let alerts = engine
            .evaluate(&txn("u1", dec!(50), "NYC", 4000))
            .await
            .unwrap();
        assert_eq!(reasons(&alerts), vec![AlertReason::HighFrequency]);
    }

    #[tokio::test]
    async fn test_high_frequency_span_boundary() {
        let engine = engine();

        // Five transactions spanning exactly 60_000ms: diff is not < 60_000
        for t in [0, 15_000, 30_000, 45_000, 60_000] {
            let alerts = engine.evaluate(&txn("u1", dec!(50), "NYC", t)).await.unwrap();
            assert!(!reasons(&alerts).contains(&AlertReason::HighFrequency));
        }

        // One more at 60_001: window now spans 15_000..60_001 = 45_001ms
        let alerts = engine
            .evaluate(&txn("u1", dec!(50), "NYC", 60_001))
            .await
            .unwrap();
        assert_eq!(reasons(&alerts), vec![AlertReason::HighFrequency]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_count_as_zero_span() {
        let engine = engine();

        for _ in 0..4 {
            engine.evaluate(&txn("u1", dec!(50), "NYC", 7000)).await.unwrap();
        }
        let alerts = engine.evaluate(&txn("u1", dec!(50), "NYC", 7000)).await.unwrap();
        assert_eq!(reasons(&alerts), vec![AlertReason::HighFrequency]);
    }

    #[tokio::test]
    async fn test_first_transaction_establishes_location_baseline() {
        let engine = engine();

        let first = engine.evaluate(&txn("u1", dec!(50), "NYC", 0)).await.unwrap();
        assert!(first.is_empty());

        let moved = engine.evaluate(&txn("u1", dec!(50), "LA", 1_000_000)).await.unwrap();
        assert_eq!(reasons(&moved), vec![AlertReason::LocationChange]);

        let stayed = engine.evaluate(&txn("u1", dec!(50), "LA", 2_000_000)).await.unwrap();
        assert!(stayed.is_empty());
    }

    #[tokio::test]
    async fn test_location_comparison_is_case_sensitive() {
        let engine = engine();

        engine.evaluate(&txn("u1", dec!(50), "nyc", 0)).await.unwrap();
        let alerts = engine
            .evaluate(&txn("u1", dec!(50), "NYC", 1_000_000))
            .await
            .unwrap();
        assert_eq!(reasons(&alerts), vec![AlertReason::LocationChange]);
    }

    #[tokio::test]
    async fn test_rules_fire_independently_in_order() {
        let engine = engine();

        engine.evaluate(&txn("u1", dec!(50), "NYC", 0)).await.unwrap();
        let alerts = engine
            .evaluate(&txn("u1", dec!(20000), "LA", 1_000_000))
            .await
            .unwrap();
        assert_eq!(
            reasons(&alerts),
            vec![AlertReason::LargeTransaction, AlertReason::LocationChange]
        );
    }

    #[tokio::test]
    async fn test_replayed_transaction_double_counts() {
        // At-least-once redelivery is not deduplicated: the same
        // transaction replayed five times fills the window (span 0) and
        // re-raises the large-transaction alert each time.
        let engine = engine();
        let repeated = txn("u1", dec!(15000), "NYC", 0);

        for i in 0..5 {
            let alerts = engine.evaluate(&repeated).await.unwrap();
            assert!(reasons(&alerts).contains(&AlertReason::LargeTransaction));
            if i == 4 {
                assert!(reasons(&alerts).contains(&AlertReason::HighFrequency));
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let engine = engine();
        let sec = 1000;

        let a = engine.evaluate(&txn("U1", dec!(15000), "NYC", 0)).await.unwrap();
        assert_eq!(reasons(&a), vec![AlertReason::LargeTransaction]);

        let b = engine.evaluate(&txn("U1", dec!(50), "LA", 10 * sec)).await.unwrap();
        assert_eq!(reasons(&b), vec![AlertReason::LocationChange]);

        let c = engine.evaluate(&txn("U1", dec!(50), "LA", 20 * sec)).await.unwrap();
        assert!(c.is_empty());
        let d = engine.evaluate(&txn("U1", dec!(50), "LA", 25 * sec)).await.unwrap();
        assert!(d.is_empty());

        // Fifth transaction: window spans 0..30s, well under a minute
        let e = engine.evaluate(&txn("U1", dec!(50), "LA", 30 * sec)).await.unwrap();
        assert_eq!(reasons(&e), vec![AlertReason::HighFrequency]);
    }

    struct FailingStore;

    #[async_trait]
    impl StateStore for FailingStore {
        async fn push_and_trim(
            &self,
            _user_id: &str,
            _timestamp: DateTime<Utc>,
            _capacity: usize,
        ) -> Result<Vec<DateTime<Utc>>, StateStoreError> {
            Err(StateStoreError::Backend("store offline".to_string()))
        }

        async fn last_location(&self, _user_id: &str) -> Result<Option<String>, StateStoreError> {
            Err(StateStoreError::Backend("store offline".to_string()))
        }

        async fn set_location(&self, _user_id: &str, _location: &str) -> Result<(), StateStoreError> {
            Err(StateStoreError::Backend("store offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_fails_whole_evaluation() {
        let engine = FraudEngine::new(Arc::new(FailingStore), RuleConfig::default());

        // The amount alone would fire, but the failed state update must
        // suppress the entire evaluation
        let result = engine.evaluate(&txn("u1", dec!(99999), "NYC", 0)).await;
        assert!(matches!(result, Err(EngineError::Store(_))));
    }
}
