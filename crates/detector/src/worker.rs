//! Partitioned Worker Pool

use event_stream::AlertSink;
use metrics::counter;
use rule_engine::{Alert, EngineError, FraudEngine};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use transaction_codec::Transaction;

/// Per-worker queue depth
const WORKER_QUEUE_DEPTH: usize = 64;

/// Retry policy for transient state-store failures. Evaluations are
/// retried, never canceled: a canceled half-applied windowing update
/// would leave per-user state inconsistent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the initial failure
    pub max_retries: u32,
    /// Base backoff, scaled linearly per attempt (milliseconds)
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 100,
        }
    }
}

/// Stable worker index for a user.
///
/// All transactions for one user hash to the same worker, which evaluates
/// them to completion in arrival order — the correctness boundary for the
/// velocity and location rules.
pub fn worker_index(user_id: &str, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    user_id.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}

/// Fixed pool of detection workers fed by per-worker FIFO queues
pub struct WorkerPool {
    senders: Vec<mpsc::Sender<Transaction>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing one engine and alert sink
    pub fn spawn(
        workers: usize,
        engine: Arc<FraudEngine>,
        sink: Arc<dyn AlertSink>,
        retry: RetryPolicy,
    ) -> Self {
        let mut senders = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let (tx, rx) = mpsc::channel(WORKER_QUEUE_DEPTH);
            senders.push(tx);
            handles.push(tokio::spawn(worker_loop(
                id,
                rx,
                engine.clone(),
                sink.clone(),
                retry.clone(),
            )));
        }

        info!("Spawned {} detection workers", workers);
        Self { senders, handles }
    }

    /// Route a transaction to its user's worker
    pub async fn dispatch(&self, txn: Transaction) {
        let index = worker_index(&txn.user_id, self.senders.len());
        if self.senders[index].send(txn).await.is_err() {
            error!("Worker {} is gone, dropping transaction", index);
        }
    }

    /// Close the queues and wait for the workers to drain
    pub async fn shutdown(self) {
        drop(self.senders);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!("Worker pool drained");
    }
}

async fn worker_loop(
    id: usize,
    mut rx: mpsc::Receiver<Transaction>,
    engine: Arc<FraudEngine>,
    sink: Arc<dyn AlertSink>,
    retry: RetryPolicy,
) {
    while let Some(txn) = rx.recv().await {
        match evaluate_with_retry(&engine, &txn, &retry).await {
            Ok(alerts) => {
                counter!("transactions_evaluated_total").increment(1);
                for alert in alerts {
                    publish_alert(sink.as_ref(), &alert).await;
                }
            }
            Err(e) => {
                // Retries exhausted: skip this record, keep the stream moving
                error!(
                    "Worker {}: dropping transaction {} after retries: {}",
                    id, txn.id, e
                );
                counter!("transactions_failed_total").increment(1);
            }
        }
    }
    info!("Worker {} stopped", id);
}

/// Evaluate with bounded linear backoff around transient store failures
async fn evaluate_with_retry(
    engine: &FraudEngine,
    txn: &Transaction,
    retry: &RetryPolicy,
) -> Result<Vec<Alert>, EngineError> {
    let mut attempt = 0;
    loop {
        match engine.evaluate(txn).await {
            Ok(alerts) => return Ok(alerts),
            Err(e) if attempt < retry.max_retries => {
                attempt += 1;
                let backoff = Duration::from_millis(retry.backoff_ms * u64::from(attempt));
                warn!(
                    "Evaluation of {} failed (attempt {}): {}, retrying in {:?}",
                    txn.id, attempt, e, backoff
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Alerts are advisory: a failed publish is logged and never rolls back
/// the already-committed state update.
async fn publish_alert(sink: &dyn AlertSink, alert: &Alert) {
    match sink.publish(alert).await {
        Ok(()) => {
            counter!("fraud_alerts_total", "reason" => alert.reason.label()).increment(1);
            warn!("Fraud alert for user {}: {}", alert.user_id, alert.reason);
        }
        Err(e) => {
            error!("Failed to publish alert for user {}: {}", alert.user_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use event_stream::StreamError;
    use rule_engine::{AlertReason, RuleConfig};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use state_store::{MemoryStateStore, StateStore, StateStoreError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

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

    #[derive(Default)]
    struct RecordingSink {
        alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertSink for RecordingSink {
        async fn publish(&self, alert: &Alert) -> Result<(), StreamError> {
            self.alerts.lock().unwrap().push(alert.clone());
            Ok(())
        }
    }

    /// Store that fails the first N window pushes, then recovers
    struct FlakyStore {
        inner: MemoryStateStore,
        failures_left: AtomicU32,
    }

    impl FlakyStore {
        fn failing(times: u32) -> Self {
            Self {
                inner: MemoryStateStore::with_default_capacity(),
                failures_left: AtomicU32::new(times),
            }
        }
    }

    #[async_trait]
    impl StateStore for FlakyStore {
        async fn push_and_trim(
            &self,
            user_id: &str,
            timestamp: DateTime<Utc>,
            capacity: usize,
        ) -> Result<Vec<DateTime<Utc>>, StateStoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StateStoreError::Backend("transient outage".to_string()));
            }
            self.inner.push_and_trim(user_id, timestamp, capacity).await
        }

        async fn last_location(&self, user_id: &str) -> Result<Option<String>, StateStoreError> {
            self.inner.last_location(user_id).await
        }

        async fn set_location(&self, user_id: &str, location: &str) -> Result<(), StateStoreError> {
            self.inner.set_location(user_id, location).await
        }
    }

    #[test]
    fn test_worker_index_is_stable_and_in_range() {
        for user in ["u1", "u2", "someone-else", ""] {
            let first = worker_index(user, 4);
            assert!(first < 4);
            assert_eq!(first, worker_index(user, 4));
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_store_failure() {
        let store = Arc::new(FlakyStore::failing(2));
        let engine = FraudEngine::new(store, RuleConfig::default());
        let retry = RetryPolicy {
            max_retries: 3,
            backoff_ms: 1,
        };

        let alerts = evaluate_with_retry(&engine, &txn("u1", dec!(15000), "NYC", 0), &retry)
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, AlertReason::LargeTransaction);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let store = Arc::new(FlakyStore::failing(10));
        let engine = FraudEngine::new(store, RuleConfig::default());
        let retry = RetryPolicy {
            max_retries: 2,
            backoff_ms: 1,
        };

        let result = evaluate_with_retry(&engine, &txn("u1", dec!(50), "NYC", 0), &retry).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_pool_evaluates_in_order_and_publishes_alerts() {
        let store = Arc::new(MemoryStateStore::with_default_capacity());
        let engine = Arc::new(FraudEngine::new(store, RuleConfig::default()));
        let sink = Arc::new(RecordingSink::default());
        let pool = WorkerPool::spawn(4, engine, sink.clone(), RetryPolicy::default());

        // Five rapid transactions for one user: the fifth trips the
        // velocity window on whichever worker owns the user
        for i in 0..5 {
            pool.dispatch(txn("u1", dec!(50), "NYC", i * 1000)).await;
        }
        pool.shutdown().await;

        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].reason, AlertReason::HighFrequency);
        assert_eq!(alerts[0].user_id, "u1");
    }
}
