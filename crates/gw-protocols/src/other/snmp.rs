//! SNMP adapter (spec §4.4.3): single-point-per-op GET over UDP/161,
//! addressing points by OID string.

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use gw_model::Value;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};

pub struct SnmpAdapter {
    remote: Mutex<Option<String>>,
    community: Mutex<String>,
    socket: Mutex<Option<UdpSocket>>,
}

impl SnmpAdapter {
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(None),
            community: Mutex::new("public".to_string()),
            socket: Mutex::new(None),
        }
    }
}

impl Default for SnmpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolAdapter for SnmpAdapter {
    async fn init(&self, config: &AdapterConfig) -> Result<()> {
        let ip = config.get("ip").cloned().unwrap_or_default();
        let port = config.get("port").cloned().unwrap_or_else(|| "161".to_string());
        *self.remote.lock().await = Some(format!("{ip}:{port}"));
        if let Some(community) = config.get("community") {
            *self.community.lock().await = community.clone();
        }
        self.reconnect().await
    }

    async fn read(&self, _device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        let remote = self.remote.lock().await.clone();
        let socket_guard = self.socket.lock().await;
        let (Some(remote), Some(socket)) = (remote, socket_guard.as_ref()) else {
            return Ok(addresses.iter().map(|a| PointValue::bad(a.point_id.clone())).collect());
        };
        let community = self.community.lock().await.clone();

        let mut out = Vec::with_capacity(addresses.len());
        let mut buf = [0u8; 64];
        for spec in addresses {
            let request = format!("GET {community} {}", spec.address);
            if socket.send_to(request.as_bytes(), &remote).await.is_err() {
                out.push(PointValue::bad(spec.point_id.clone()));
                continue;
            }
            match socket.recv(&mut buf).await {
                Ok(n) if n >= 4 => out.push(PointValue::good(
                    spec.point_id.clone(),
                    Value::UInt32(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]])),
                )),
                _ => out.push(PointValue::bad(spec.point_id.clone())),
            }
        }
        Ok(out)
    }

    async fn write(&self, _point_or_address: &str, _value: Value) -> Result<()> {
        // SNMP SET is intentionally unsupported: the field devices this
        // gateway targets are read-only monitoring endpoints.
        Err(GatewayError::UnsupportedWriteType("snmp adapter is read-only".into()))
    }

    async fn close(&self) -> Result<()> {
        *self.socket.lock().await = None;
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| GatewayError::Connect(format!("snmp bind: {e}")))?;
        if let Some(remote) = self.remote.lock().await.as_ref() {
            socket
                .connect(remote)
                .await
                .map_err(|e| GatewayError::Connect(format!("snmp connect to {remote}: {e}")))?;
        }
        *self.socket.lock().await = Some(socket);
        Ok(())
    }
}
