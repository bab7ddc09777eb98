//! Raw TCP adapter (spec §4.4.3): line-oriented `GET <address>\n` /
//! `SET <address> <value>\n` protocol for field devices with no
//! standardized wire format, one point per operation.

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use gw_model::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};

pub struct TcpAdapter {
    addr: Mutex<Option<String>>,
    stream: Mutex<Option<BufReader<TcpStream>>>,
}

impl TcpAdapter {
    pub fn new() -> Self {
        Self {
            addr: Mutex::new(None),
            stream: Mutex::new(None),
        }
    }
}

impl Default for TcpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolAdapter for TcpAdapter {
    async fn init(&self, config: &AdapterConfig) -> Result<()> {
        let ip = config.get("ip").cloned().unwrap_or_default();
        let port = config.get("port").cloned().unwrap_or_default();
        *self.addr.lock().await = Some(format!("{ip}:{port}"));
        self.reconnect().await
    }

    async fn read(&self, _device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Ok(addresses.iter().map(|a| PointValue::bad(a.point_id.clone())).collect());
        };

        let mut out = Vec::with_capacity(addresses.len());
        for spec in addresses {
            let request = format!("GET {}\n", spec.address);
            if stream.get_mut().write_all(request.as_bytes()).await.is_err() {
                out.push(PointValue::bad(spec.point_id.clone()));
                continue;
            }
            let mut line = String::new();
            match stream.read_line(&mut line).await {
                Ok(0) => out.push(PointValue::bad(spec.point_id.clone())),
                Ok(_) => match line.trim().parse::<f64>() {
                    Ok(v) => out.push(PointValue::good(spec.point_id.clone(), Value::Float64(v))),
                    Err(_) => out.push(PointValue::good(spec.point_id.clone(), Value::Str(line.trim().to_string()))),
                },
                Err(_) => out.push(PointValue::bad(spec.point_id.clone())),
            }
        }
        Ok(out)
    }

    async fn write(&self, point_or_address: &str, value: Value) -> Result<()> {
        let mut guard = self.stream.lock().await;
        let stream = guard
            .as_mut()
            .ok_or_else(|| GatewayError::Write("tcp client not connected".into()))?;
        let rendered = match value {
            Value::Bool(b) => b.to_string(),
            Value::Int64(i) => i.to_string(),
            Value::UInt16(u) => u.to_string(),
            Value::UInt32(u) => u.to_string(),
            Value::Float64(f) => f.to_string(),
            Value::Str(s) => s,
            other => return Err(GatewayError::UnsupportedWriteType(format!("{other:?}"))),
        };
        let request = format!("SET {point_or_address} {rendered}\n");
        stream
            .get_mut()
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
            return Err(GatewayError::Connect("tcp adapter has no address configured".into()));
        };
        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| GatewayError::Connect(format!("tcp connect to {addr}: {e}")))?;
        *self.stream.lock().await = Some(BufReader::new(stream));
        Ok(())
    }
}
