//! MQTT uplink (spec §4.8): persistent session, QoS 1, configurable
//! broker/clientId/topic/credentials.
//!
//! Grounded on `original_source/uplink/mqtt_uplink.go`'s `MQTTUplink` and
//! the teacher's `rumqttc` event-loop-in-a-background-task shape (see
//! `services/netsrv/src/network/mqtt.rs`): `AsyncClient::new` returns a
//! client plus an `EventLoop` that must be polled continuously or the
//! connection stalls.

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;

use crate::channel::UplinkChannel;
use crate::config::MqttConfig;

pub struct MqttUplink {
    config: MqttConfig,
    client: AsyncClient,
}

impl MqttUplink {
    /// Connects and spawns the background event-loop-poll task. Per spec
    /// §4.8, the session is persistent (`clean_session = false`): a
    /// dropped connection resumes its QoS-1 in-flight state on
    /// reconnect rather than starting fresh.
    pub fn connect(config: MqttConfig) -> Self {
        let (host, port) = split_broker(&config.broker);
        let mut options = MqttOptions::new(&config.client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(false);
        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            options.set_credentials(user, pass);
        }

        let (client, mut event_loop) = AsyncClient::new(options, 16);
        let client_id = config.client_id.clone();
        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        tracing::info!("mqtt uplink `{client_id}` connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("mqtt uplink `{client_id}` event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self { config, client }
    }
}

#[async_trait]
impl UplinkChannel for MqttUplink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        self.client
            .publish(&self.config.topic, QoS::AtLeastOnce, false, payload.to_vec())
            .await
            .map_err(|e| GatewayError::Send {
                channel: self.config.name.clone(),
                reason: e.to_string(),
            })
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "mqtt"
    }
}

/// Splits a `tcp://host:port` / `ssl://host:port` / `host:port` broker
/// string into `(host, port)`, defaulting to 1883.
pub(crate) fn split_broker(broker: &str) -> (String, u16) {
    let without_scheme = broker.splitn(2, "://").last().unwrap_or(broker);
    match without_scheme.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(1883)),
        None => (without_scheme.to_string(), 1883),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_scheme_host_port() {
        assert_eq!(split_broker("tcp://localhost:1883"), ("localhost".to_string(), 1883));
        assert_eq!(split_broker("broker.example.com:8883"), ("broker.example.com".to_string(), 8883));
        assert_eq!(split_broker("justhost"), ("justhost".to_string(), 1883));
    }
}
