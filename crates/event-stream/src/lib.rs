//! Event Stream Transport
//!
//! MQTT-based plumbing for the two streams the pipeline rides on:
//! - `transactions`: ingested records heading for the rule engine
//! - `fraud-alerts`: alerts heading for downstream notifiers
//!
//! Delivery is at-least-once (QoS 1); redelivery and duplicate alerts are
//! accepted by the pipeline design.

mod consume;
mod error;
mod publish;

pub use consume::subscribe;
pub use error::StreamError;
pub use publish::StreamPublisher;

use async_trait::async_trait;
use rule_engine::Alert;
use serde::{Deserialize, Serialize};

/// Broker and topic configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Broker host
    pub broker_host: String,
    /// Broker port
    pub broker_port: u16,
    /// Client id prefix; each connection appends its role
    pub client_id: String,
    /// Keep-alive interval (seconds)
    pub keep_alive_secs: u64,
    /// Topic carrying ingested transactions
    pub transactions_topic: String,
    /// Topic carrying raised alerts
    pub alerts_topic: String,
    /// Consumer channel capacity
    pub channel_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            client_id: "fraudstream".to_string(),
            keep_alive_secs: 30,
            transactions_topic: "transactions".to_string(),
            alerts_topic: "fraud-alerts".to_string(),
            channel_capacity: 64,
        }
    }
}

/// Abstract publish seam for raised alerts.
///
/// The detection service only sees this trait, so tests can substitute a
/// recording or failing sink for the broker-backed publisher.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn publish(&self, alert: &Alert) -> Result<(), StreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.broker_port, 1883);
        assert_eq!(config.transactions_topic, "transactions");
        assert_eq!(config.alerts_topic, "fraud-alerts");
    }
}
