//! Mitsubishi SLMP adapter (spec §4.4.3): single-point-per-op reads over
//! UDP, mirroring the 3E frame's request/response shape at a level of
//! detail sufficient for the shared contract (full SLMP framing is out
//! of scope for this gateway's core).

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use gw_model::Value;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};

pub struct SlmpAdapter {
    remote: Mutex<Option<String>>,
    socket: Mutex<Option<UdpSocket>>,
}

impl SlmpAdapter {
    pub fn new() -> Self {
        Self {
            remote: Mutex::new(None),
            socket: Mutex::new(None),
        }
    }
}

impl Default for SlmpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolAdapter for SlmpAdapter {
    async fn init(&self, config: &AdapterConfig) -> Result<()> {
        let ip = config.get("ip").cloned().unwrap_or_default();
        let port = config.get("port").cloned().unwrap_or_else(|| "5007".to_string());
        *self.remote.lock().await = Some(format!("{ip}:{port}"));
        self.reconnect().await
    }

    async fn read(&self, _device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        let remote = self.remote.lock().await.clone();
        let socket_guard = self.socket.lock().await;
        let (Some(remote), Some(socket)) = (remote, socket_guard.as_ref()) else {
            return Ok(addresses.iter().map(|a| PointValue::bad(a.point_id.clone())).collect());
        };

        let mut out = Vec::with_capacity(addresses.len());
        let mut buf = [0u8; 32];
        for spec in addresses {
            let request = format!("RD {}", spec.address);
            if socket.send_to(request.as_bytes(), &remote).await.is_err() {
                out.push(PointValue::bad(spec.point_id.clone()));
                continue;
            }
            match socket.recv(&mut buf).await {
                Ok(n) if n >= 2 => out.push(PointValue::good(
                    spec.point_id.clone(),
                    Value::UInt16(u16::from_be_bytes([buf[0], buf[1]])),
                )),
                _ => out.push(PointValue::bad(spec.point_id.clone())),
            }
        }
        Ok(out)
    }

    async fn write(&self, point_or_address: &str, value: Value) -> Result<()> {
        let remote = self
            .remote
            .lock()
            .await
            .clone()
            .ok_or_else(|| GatewayError::Write("slmp adapter has no address configured".into()))?;
        let socket_guard = self.socket.lock().await;
        let socket = socket_guard
            .as_ref()
            .ok_or_else(|| GatewayError::Write("slmp socket not open".into()))?;
        let payload = match value {
            Value::UInt16(u) => u,
            Value::Int64(i) if (0..=u16::MAX as i64).contains(&i) => i as u16,
            other => return Err(GatewayError::UnsupportedWriteType(format!("{other:?}"))),
        };
        let request = format!("WR {point_or_address} {payload}");
        socket
            .send_to(request.as_bytes(), &remote)
            .await
            .map_err(|e| GatewayError::Write(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.socket.lock().await = None;
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| GatewayError::Connect(format!("slmp bind: {e}")))?;
        if let Some(remote) = self.remote.lock().await.as_ref() {
            socket
                .connect(remote)
                .await
                .map_err(|e| GatewayError::Connect(format!("slmp connect to {remote}: {e}")))?;
        }
        *self.socket.lock().await = Some(socket);
        Ok(())
    }
}
