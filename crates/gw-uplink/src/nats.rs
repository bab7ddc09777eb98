//! NATS uplink (spec §4.8): subject-addressed publish.
//!
//! Grounded on `original_source/uplink/uplink.go`'s `nats.NatsUplink`
//! placeholder ("生产应传入连接参数" — production should supply real
//! connection parameters), built out on `async-nats`'s `Client`.

use async_trait::async_trait;
use async_nats::Client;
use gw_errors::{GatewayError, Result};

use crate::channel::UplinkChannel;
use crate::config::NatsConfig;

pub struct NatsUplink {
    config: NatsConfig,
    client: Client,
}

impl NatsUplink {
    pub async fn connect(config: NatsConfig) -> Result<Self> {
        let client = async_nats::connect(&config.url).await.map_err(|e| GatewayError::Send {
            channel: config.name.clone(),
            reason: format!("nats connect: {e}"),
        })?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl UplinkChannel for NatsUplink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        self.client
            .publish(self.config.subject.clone(), payload.to_vec().into())
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
        "nats"
    }
}
