//! Telemetry publishing to the MQTT broker
//!
//! Decoded payloads are published as JSON to
//! `{base_topic}/{logger_serial}/{information|data}`. The broker
//! connection lives in a background event-loop task for the process
//! lifetime; publish failures are reported to the caller and logged there,
//! they never affect the device-facing connection.

use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use tracing::{debug, warn};

use crate::config::MqttConfig;
use crate::error::Result;

/// Narrow publishing capability consumed by the orchestrator
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
}

/// MQTT-backed publisher
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Create the broker client and spawn its event loop
    pub fn connect(config: &MqttConfig) -> Result<Self> {
        let mut options = MqttOptions::new(&config.client_id, &config.hostname, config.port);
        options.set_keep_alive(Duration::from_secs(30));
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        // The event loop reconnects on the next poll after an error; back
        // off briefly so a dead broker does not spin the task.
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(event) => debug!("MQTT event: {:?}", event),
                    Err(e) => {
                        warn!("MQTT event loop error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        debug!("published {} bytes to {}", payload.len(), topic);
        Ok(())
    }
}
