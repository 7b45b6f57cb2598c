//! Alert Notifier Service
//!
//! Consumes the fraud-alert stream, logs every alert, and keeps the last
//! few alerts per user for inspection. Alerts are advisory and terminal:
//! nothing here mutates or deduplicates them.

mod config;

pub use self::config::{ConfigurationError, NotifierConfig};

use metrics::counter;
use rule_engine::Alert;
use state_store::MemoryStateStore;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the notifier until the alert stream closes
pub async fn run(config: NotifierConfig) -> anyhow::Result<()> {
    let store = MemoryStateStore::new(config.max_tracked_users);
    let mut payloads = event_stream::subscribe(&config.stream, &config.stream.alerts_topic).await?;

    info!("Consuming alerts from {}", config.stream.alerts_topic);

    while let Some(payload) = payloads.recv().await {
        handle_payload(&store, &payload, config.recent_capacity);
    }

    Ok(())
}

/// Decode, log, and record one alert. Malformed payloads are skipped so
/// one bad record never stalls the stream.
fn handle_payload(store: &MemoryStateStore, payload: &[u8], capacity: usize) {
    let alert: Alert = match serde_json::from_slice(payload) {
        Ok(alert) => alert,
        Err(e) => {
            warn!("Skipping malformed alert: {}", e);
            counter!("alerts_rejected_total").increment(1);
            return;
        }
    };

    warn!(
        "Fraud alert for user {}: {} (transaction {}, amount {})",
        alert.user_id, alert.reason, alert.transaction.id, alert.transaction.amount
    );
    counter!("alerts_received_total", "reason" => alert.reason.label()).increment(1);

    match serde_json::to_value(&alert) {
        Ok(entry) => {
            if let Err(e) = store.push_recent(&alert.user_id, entry, capacity) {
                error!("Failed to record alert for user {}: {}", alert.user_id, e);
            }
        }
        Err(e) => error!("Failed to serialize alert for user {}: {}", alert.user_id, e),
    }
}
