//! Redis uplink (spec §4.8): PUB/SUB topic publish.
//!
//! Grounded on `original_source/uplink/uplink.go`'s `redis.RedisUplink`
//! placeholder and the teacher's `redis::aio::ConnectionManager`
//! convention (`services/comsrv/src/core/redis/publisher.rs`).

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use crate::channel::UplinkChannel;
use crate::config::RedisConfig;

pub struct RedisUplink {
    config: RedisConfig,
    conn: Mutex<ConnectionManager>,
}

impl RedisUplink {
    pub async fn connect(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| GatewayError::Send {
            channel: config.name.clone(),
            reason: format!("redis client: {e}"),
        })?;
        let conn = client.get_connection_manager().await.map_err(|e| GatewayError::Send {
            channel: config.name.clone(),
            reason: format!("redis connect: {e}"),
        })?;
        Ok(Self {
            config,
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl UplinkChannel for RedisUplink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.publish::<_, _, ()>(&self.config.topic, payload).await.map_err(|e| GatewayError::Send {
            channel: self.config.name.clone(),
            reason: e.to_string(),
        })
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "redis"
    }
}
