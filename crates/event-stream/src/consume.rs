//! Stream Consumer

use crate::{StreamConfig, StreamError};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Subscribe to `topic` and forward publish payloads to the returned
/// channel, in arrival order.
///
/// Poll errors are logged and retried after a backoff; the subscription is
/// re-issued whenever the broker session is re-established. The poll loop
/// stops once the receiver is dropped.
pub async fn subscribe(
    config: &StreamConfig,
    topic: &str,
) -> Result<mpsc::Receiver<Vec<u8>>, StreamError> {
    let mut options = MqttOptions::new(
        format!("{}-consumer-{}", config.client_id, topic),
        &config.broker_host,
        config.broker_port,
    );
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

    let (client, mut eventloop) = AsyncClient::new(options, 10);
    client
        .subscribe(topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| StreamError::Connection(e.to_string()))?;

    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let topic_owned = topic.to_string();

    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if tx.send(publish.payload.to_vec()).await.is_err() {
                        debug!("Receiver for {} dropped, stopping consumer", topic_owned);
                        break;
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // Fresh session: the subscription does not survive it
                    if let Err(e) = client.try_subscribe(&topic_owned, QoS::AtLeastOnce) {
                        error!("Resubscribe to {} failed: {}", topic_owned, e);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT error on {}: {}", topic_owned, e);
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            }
        }
    });

    info!("Subscribed to topic {}", topic);
    Ok(rx)
}
