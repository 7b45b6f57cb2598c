//! Stream Publisher

use crate::{AlertSink, StreamConfig, StreamError};
use async_trait::async_trait;
use rule_engine::Alert;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, info};
use transaction_codec::Transaction;

/// Broker-backed producer for the transaction and alert topics
pub struct StreamPublisher {
    config: StreamConfig,
    client: AsyncClient,
}

impl StreamPublisher {
    /// Connect to the broker and spawn the eventloop driver
    pub async fn connect(config: &StreamConfig) -> Result<Self, StreamError> {
        let mut options = MqttOptions::new(
            format!("{}-producer", config.client_id),
            &config.broker_host,
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(event) => {
                        debug!("MQTT event: {:?}", event);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        info!(
            "Publisher connected to broker {}:{}",
            config.broker_host, config.broker_port
        );
        Ok(Self {
            config: config.clone(),
            client,
        })
    }

    /// Publish an ingested transaction onto the transaction stream
    pub async fn publish_transaction(&self, txn: &Transaction) -> Result<(), StreamError> {
        self.publish_json(&self.config.transactions_topic, txn).await
    }

    /// Publish a raised alert onto the alert stream
    pub async fn publish_alert(&self, alert: &Alert) -> Result<(), StreamError> {
        self.publish_json(&self.config.alerts_topic, alert).await
    }

    async fn publish_json<T: Serialize>(&self, topic: &str, value: &T) -> Result<(), StreamError> {
        let payload =
            serde_json::to_vec(value).map_err(|e| StreamError::Serialization(e.to_string()))?;

        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| StreamError::Publish(e.to_string()))
    }
}

#[async_trait]
impl AlertSink for StreamPublisher {
    async fn publish(&self, alert: &Alert) -> Result<(), StreamError> {
        self.publish_alert(alert).await
    }
}
