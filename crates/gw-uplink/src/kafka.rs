//! Kafka uplink (spec §4.8): topic-addressed producer.
//!
//! Grounded on `original_source/uplink/uplink.go`'s `kafka.KafkaUplink`
//! placeholder, built out on `rdkafka`'s `FutureProducer` (the
//! `tokio`-integrated producer the workspace carries `rdkafka`'s
//! `tokio` feature for).

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;

use crate::channel::UplinkChannel;
use crate::config::KafkaConfig;

pub struct KafkaUplink {
    config: KafkaConfig,
    producer: FutureProducer,
}

impl KafkaUplink {
    pub fn new(config: KafkaConfig) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| GatewayError::Send {
                channel: config.name.clone(),
                reason: format!("kafka producer init: {e}"),
            })?;
        Ok(Self { config, producer })
    }
}

#[async_trait]
impl UplinkChannel for KafkaUplink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        let record = FutureRecord::to(&self.config.topic).payload(payload).key(&self.config.name);
        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(e, _)| GatewayError::Send {
                channel: self.config.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "kafka"
    }
}
