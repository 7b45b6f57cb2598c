//! Fraud Detection Service
//!
//! Consumes the transaction stream, routes each record to a per-user
//! serialized worker, evaluates the fraud rules, and publishes alerts.

mod config;
mod worker;

pub use self::config::{ConfigurationError, DetectorConfig};
pub use self::worker::{worker_index, RetryPolicy, WorkerPool};

use event_stream::{AlertSink, StreamPublisher};
use metrics::counter;
use rule_engine::FraudEngine;
use state_store::MemoryStateStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use transaction_codec::decode_transaction;

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the detection pipeline until the transaction stream closes
pub async fn run(config: DetectorConfig) -> anyhow::Result<()> {
    let store = Arc::new(MemoryStateStore::new(config.max_tracked_users));
    let engine = Arc::new(FraudEngine::new(store, config.rules.clone()));

    let publisher = StreamPublisher::connect(&config.stream).await?;
    let sink: Arc<dyn AlertSink> = Arc::new(publisher);

    let pool = WorkerPool::spawn(config.workers, engine, sink, config.retry_policy());
    let payloads = event_stream::subscribe(&config.stream, &config.stream.transactions_topic).await?;

    info!(
        "Consuming transactions from {} with {} workers",
        config.stream.transactions_topic, config.workers
    );
    consume(payloads, &pool).await;

    pool.shutdown().await;
    Ok(())
}

/// Decode and dispatch payloads until the stream closes. Malformed
/// records are skipped so one bad payload never stalls the stream.
async fn consume(mut payloads: mpsc::Receiver<Vec<u8>>, pool: &WorkerPool) {
    while let Some(payload) = payloads.recv().await {
        match decode_transaction(&payload) {
            Ok(txn) => {
                counter!("transactions_consumed_total").increment(1);
                pool.dispatch(txn).await;
            }
            Err(e) => {
                warn!("Skipping malformed transaction: {}", e);
                counter!("transactions_rejected_total").increment(1);
            }
        }
    }
}
