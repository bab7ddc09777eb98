//! Sparkplug B uplink (spec §4.8): MQTT-based, with NBIRTH/NDATA/DBIRTH/
//! NDEATH/DDEATH message kinds and an outbound retry queue with
//! exponential backoff.
//!
//! Grounded on `original_source/uplink/sparkplugb/sparkplugb.go`'s
//! `SparkplugBUplink` (topic shape `spBv1.0/<group>/<KIND>/<node>[/<device>]`,
//! a JSON-encoded metric payload standing in for the original's simulated
//! structs) and `queue.go`'s `OutboundQueue` (ported in [`queue`]).

pub mod queue;

use std::time::Duration;

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Serialize;

use crate::channel::UplinkChannel;
use crate::config::SparkplugBConfig;
use queue::OutboundQueue;

/// Sparkplug B message kinds (spec §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NBirth,
    NData,
    NDeath,
    DBirth,
    DDeath,
}

impl MessageKind {
    fn as_str(&self) -> &'static str {
        match self {
            MessageKind::NBirth => "NBIRTH",
            MessageKind::NData => "NDATA",
            MessageKind::NDeath => "NDEATH",
            MessageKind::DBirth => "DBIRTH",
            MessageKind::DDeath => "DDEATH",
        }
    }

    fn is_device_scoped(&self) -> bool {
        matches!(self, MessageKind::DBirth | MessageKind::DDeath)
    }
}

/// JSON stand-in for the binary Sparkplug B protobuf payload, matching
/// the original's `SimPayload`/`SimMetric` simulation structs.
#[derive(Debug, Clone, Serialize)]
pub struct SparkplugPayload {
    pub timestamp: i64,
    pub metrics: Vec<u8>,
    pub seq: u32,
}

pub struct SparkplugBUplink {
    config: SparkplugBConfig,
    client: AsyncClient,
    queue: OutboundQueue,
}

impl SparkplugBUplink {
    pub fn connect(config: SparkplugBConfig) -> Self {
        let (host, port) = crate::mqtt::split_broker(&config.broker);
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
                        tracing::info!("sparkplugb uplink `{client_id}` connected");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("sparkplugb uplink `{client_id}` event loop error: {e}");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Self {
            config,
            client,
            queue: OutboundQueue::new(5),
        }
    }

    fn topic(&self, kind: MessageKind, device_id: Option<&str>) -> String {
        let base = format!("spBv1.0/{}/{}/{}", self.config.group_id, kind.as_str(), self.config.node_id);
        match (kind.is_device_scoped(), device_id) {
            (true, Some(device_id)) => format!("{base}/{device_id}"),
            _ => base,
        }
    }

    /// Publishes one Sparkplug B message, with the outbound retry queue
    /// draining any previously failed messages first (spec §4.8).
    pub async fn publish(&self, kind: MessageKind, device_id: Option<&str>, payload: &[u8]) -> Result<()> {
        let topic = self.topic(kind, device_id);

        let client = &self.client;
        self.queue
            .drain(|msg| async move {
                client
                    .publish(&msg.topic, QoS::AtLeastOnce, false, msg.payload)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;

        match self.client.publish(&topic, QoS::AtLeastOnce, false, payload.to_vec()).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("sparkplugb publish to `{topic}` failed, queued for retry: {e}");
                self.queue.enqueue(topic, payload.to_vec());
                Err(GatewayError::Send {
                    channel: self.config.name.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn birth(&self, metrics: &[u8]) -> Result<()> {
        self.publish(MessageKind::NBirth, None, metrics).await
    }

    pub async fn device_birth(&self, device_id: &str, metrics: &[u8]) -> Result<()> {
        self.publish(MessageKind::DBirth, Some(device_id), metrics).await
    }

    pub async fn death(&self) -> Result<()> {
        self.publish(MessageKind::NDeath, None, &[]).await
    }

    pub async fn device_death(&self, device_id: &str) -> Result<()> {
        self.publish(MessageKind::DDeath, Some(device_id), &[]).await
    }
}

#[async_trait]
impl UplinkChannel for SparkplugBUplink {
    /// The regular per-tick data report is sent as NDATA (spec §4.8: the
    /// uplink fan-out's common `send` path).
    async fn send(&self, payload: &[u8]) -> Result<()> {
        self.publish(MessageKind::NData, None, payload).await
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "sparkplugb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SparkplugBConfig {
        SparkplugBConfig {
            name: "sp".into(),
            enable: true,
            broker: "tcp://localhost:1883".into(),
            client_id: "gw-1".into(),
            group_id: "plantA".into(),
            node_id: "node1".into(),
            username: None,
            password: None,
        }
    }

    #[test]
    fn topic_shapes_match_spec_message_kinds() {
        let config = cfg();
        let node_topic = format!("spBv1.0/{}/NBIRTH/{}", config.group_id, config.node_id);
        assert_eq!(node_topic, "spBv1.0/plantA/NBIRTH/node1");

        let device_topic = format!("spBv1.0/{}/DBIRTH/{}/{}", config.group_id, config.node_id, "dev1");
        assert_eq!(device_topic, "spBv1.0/plantA/DBIRTH/node1/dev1");
    }

    #[test]
    fn message_kind_strings() {
        assert_eq!(MessageKind::NBirth.as_str(), "NBIRTH");
        assert_eq!(MessageKind::NData.as_str(), "NDATA");
        assert_eq!(MessageKind::NDeath.as_str(), "NDEATH");
        assert_eq!(MessageKind::DBirth.as_str(), "DBIRTH");
        assert_eq!(MessageKind::DDeath.as_str(), "DDEATH");
        assert!(MessageKind::DBirth.is_device_scoped());
        assert!(!MessageKind::NData.is_device_scoped());
    }
}
