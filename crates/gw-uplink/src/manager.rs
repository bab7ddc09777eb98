//! Uplink fan-out (spec §4.8): parallel send to all enabled channels
//! with per-send error isolation, plus append-only `uplink.log`
//! persistence of every send result.
//!
//! Grounded on `original_source/uplink/manager.go`'s `UplinkManager` /
//! `SendToAll` and `uplink.go`'s `UplinkFactory`.

use std::sync::Arc;

use futures::future::join_all;
use gw_common::NdjsonLog;
use serde_json::json;

use crate::channel::UplinkChannel;
use crate::config::UplinkConfig;
use crate::http::HttpUplink;
use crate::kafka::KafkaUplink;
use crate::mqtt::MqttUplink;
use crate::nats::NatsUplink;
use crate::redis_uplink::RedisUplink;
use crate::sparkplugb::SparkplugBUplink;

pub struct UplinkManager {
    channels: Vec<Arc<dyn UplinkChannel>>,
    log: Option<NdjsonLog>,
}

impl UplinkManager {
    pub fn new(channels: Vec<Arc<dyn UplinkChannel>>) -> Self {
        Self { channels, log: None }
    }

    pub fn with_log(mut self, log: NdjsonLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Constructs every enabled channel from config (spec §9 design note:
    /// client pool/registry-style construction at boot). A channel whose
    /// connection setup fails is logged and skipped; it never aborts
    /// boot for the others.
    pub async fn from_config(configs: Vec<UplinkConfig>) -> Self {
        let mut channels: Vec<Arc<dyn UplinkChannel>> = Vec::new();

        for config in configs.into_iter().filter(UplinkConfig::enabled) {
            let built: Result<Arc<dyn UplinkChannel>, String> = match config {
                UplinkConfig::Mqtt(c) => Ok(Arc::new(MqttUplink::connect(c))),
                UplinkConfig::Http(c) => Ok(Arc::new(HttpUplink::new(c))),
                UplinkConfig::Kafka(c) => KafkaUplink::new(c).map(|u| Arc::new(u) as Arc<dyn UplinkChannel>).map_err(|e| e.to_string()),
                UplinkConfig::Nats(c) => NatsUplink::connect(c).await.map(|u| Arc::new(u) as Arc<dyn UplinkChannel>).map_err(|e| e.to_string()),
                UplinkConfig::Redis(c) => RedisUplink::connect(c).await.map(|u| Arc::new(u) as Arc<dyn UplinkChannel>).map_err(|e| e.to_string()),
                UplinkConfig::SparkplugB(c) => Ok(Arc::new(SparkplugBUplink::connect(c))),
            };

            match built {
                Ok(channel) => channels.push(channel),
                Err(e) => tracing::warn!("uplink channel construction failed, skipping: {e}"),
            }
        }

        Self::new(channels)
    }

    /// `send_to_all(payload)` (spec §4.8): every enabled uplink gets the
    /// same bytes, in parallel; one channel's `SendError` never blocks or
    /// cancels another's send.
    pub async fn send_to_all(&self, payload: &[u8]) {
        let sends = self.channels.iter().map(|channel| {
            let channel = channel.clone();
            let payload = payload.to_vec();
            async move {
                let result = channel.send(&payload).await;
                (channel.name().to_string(), channel.kind().to_string(), result)
            }
        });

        for (name, kind, result) in join_all(sends).await {
            if let Err(e) = &result {
                tracing::warn!("uplink send failed on `{name}` ({kind}): {e}");
            }
            if let Some(log) = &self.log {
                log.append(&json!({
                    "uplink": name,
                    "type": kind,
                    "ok": result.is_ok(),
                    "error": result.err().map(|e| e.to_string()),
                }));
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gw_errors::{GatewayError, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingChannel {
        name: String,
        fail: bool,
        sends: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UplinkChannel for RecordingChannel {
        async fn send(&self, _payload: &[u8]) -> Result<()> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GatewayError::Send {
                    channel: self.name.clone(),
                    reason: "boom".into(),
                })
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> &str {
            "test"
        }
    }

    #[tokio::test]
    async fn a_failing_channel_does_not_block_the_others() {
        let sends = Arc::new(AtomicUsize::new(0));
        let manager = UplinkManager::new(vec![
            Arc::new(RecordingChannel {
                name: "a".into(),
                fail: true,
                sends: sends.clone(),
            }),
            Arc::new(RecordingChannel {
                name: "b".into(),
                fail: false,
                sends: sends.clone(),
            }),
        ]);

        manager.send_to_all(b"payload").await;
        assert_eq!(sends.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn uplink_log_records_one_line_per_channel() {
        let dir = tempfile::tempdir().unwrap();
        let log = NdjsonLog::open(dir.path().join("uplink.log")).unwrap();
        let sends = Arc::new(AtomicUsize::new(0));
        let manager = UplinkManager::new(vec![Arc::new(RecordingChannel {
            name: "a".into(),
            fail: false,
            sends,
        })])
        .with_log(log);

        manager.send_to_all(b"x").await;
        let contents = std::fs::read_to_string(dir.path().join("uplink.log")).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }
}
