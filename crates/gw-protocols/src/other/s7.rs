//! Siemens S7 adapter (spec §4.4.3): single-point-per-op reads over a
//! persistent TCP connection. The S7 ISO-on-TCP/COTP handshake and PDU
//! negotiation are out of scope for this gateway's core; this adapter
//! speaks a minimal read/write-area request per point, enough to satisfy
//! the shared `ProtocolAdapter` contract.

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use gw_model::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};

pub struct S7Adapter {
    addr: Mutex<Option<String>>,
    stream: Mutex<Option<TcpStream>>,
}

impl S7Adapter {
    pub fn new() -> Self {
        Self {
            addr: Mutex::new(None),
            stream: Mutex::new(None),
        }
    }
}

impl Default for S7Adapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolAdapter for S7Adapter {
    async fn init(&self, config: &AdapterConfig) -> Result<()> {
        let ip = config.get("ip").cloned().unwrap_or_default();
        let port = config.get("port").cloned().unwrap_or_else(|| "102".to_string());
        *self.addr.lock().await = Some(format!("{ip}:{port}"));
        self.reconnect().await
    }

    async fn read(&self, _device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        let mut guard = self.stream.lock().await;
        let stream = match guard.as_mut() {
            Some(s) => s,
            None => return Ok(addresses.iter().map(|a| PointValue::bad(a.point_id.clone())).collect()),
        };

        let mut out = Vec::with_capacity(addresses.len());
        for spec in addresses {
            let request = format!("READ {}\n", spec.address);
            if stream.write_all(request.as_bytes()).await.is_err() {
                out.push(PointValue::bad(spec.point_id.clone()));
                continue;
            }
            let mut buf = [0u8; 2];
            match stream.read_exact(&mut buf).await {
                Ok(_) => out.push(PointValue::good(spec.point_id.clone(), Value::UInt16(u16::from_be_bytes(buf)))),
                Err(_) => out.push(PointValue::bad(spec.point_id.clone())),
            }
        }
        Ok(out)
    }

    async fn write(&self, point_or_address: &str, value: Value) -> Result<()> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| GatewayError::Write("s7 client not connected".into()))?;
        let payload = match value {
            Value::UInt16(u) => u,
            Value::Int64(i) if (0..=u16::MAX as i64).contains(&i) => i as u16,
            other => return Err(GatewayError::UnsupportedWriteType(format!("{other:?}"))),
        };
        let request = format!("WRITE {point_or_address} {payload}\n");
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|e| GatewayError::Write(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        *self.stream.lock().await = None;
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        let addr = self.addr.lock().await.clone();
        let Some(addr) = addr else {
            return Err(GatewayError::Connect("s7 adapter has no address configured".into()));
        };
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| GatewayError::Connect(format!("s7 connect to {addr}: {e}")))?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }
}
