//! Modbus/TCP `ProtocolAdapter` implementation: wires the planner (§4.4.1)
//! and codec to a real `TcpStream`, one request in flight at a time per
//! client (spec §5: "industrial devices often reject overlapped
//! requests").

use std::sync::atomic::{AtomicU16, AtomicU8, Ordering};

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use gw_model::Value;
use parking_lot::Mutex as SyncMutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};
use crate::modbus::codec;
use crate::modbus::planner::{parse_write_address, plan_groups};

pub struct ModbusTcpAdapter {
    ip: SyncMutex<String>,
    port: SyncMutex<u16>,
    slave_id: AtomicU8,
    transaction_id: AtomicU16,
    stream: Mutex<Option<TcpStream>>,
}

impl ModbusTcpAdapter {
    pub fn new() -> Self {
        Self {
            ip: SyncMutex::new(String::new()),
            port: SyncMutex::new(502),
            slave_id: AtomicU8::new(1),
            transaction_id: AtomicU16::new(1),
            stream: Mutex::new(None),
        }
    }

    /// Mutable at runtime (spec §4.4.1): devices that share a TCP
    /// endpoint but different RTU-unit IDs flip this between ticks; the
    /// planner re-asserts it before every group.
    pub fn set_slave(&self, slave_id: u8) {
        self.slave_id.store(slave_id, Ordering::SeqCst);
    }

    fn next_transaction_id(&self) -> u16 {
        self.transaction_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<TcpStream> {
        let addr = format!("{}:{}", self.ip.lock(), self.port.lock());
        TcpStream::connect(&addr)
            .await
            .map_err(|e| GatewayError::Connect(format!("modbus tcp connect to {addr}: {e}")))
    }

    async fn ensure_connected(&self) -> Result<()> {
        let mut guard = self.stream.lock().await;
        if guard.is_none() {
            *guard = Some(self.connect().await?);
        }
        Ok(())
    }

    async fn roundtrip(&self, frame: &[u8]) -> Result<Vec<u8>> {
        self.ensure_connected().await?;
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or_else(|| GatewayError::Read("modbus client not connected".into()))?;

        if let Err(e) = stream.write_all(frame).await {
            *guard = None;
            return Err(GatewayError::Read(format!("modbus write failed: {e}")));
        }

        let mut header = [0u8; 7];
        if let Err(e) = stream.read_exact(&mut header).await {
            *guard = None;
            return Err(GatewayError::Read(format!("modbus header read failed: {e}")));
        }
        let (_, pdu_len) = codec::parse_mbap_header(&header)?;
        let mut pdu = vec![0u8; pdu_len as usize];
        if let Err(e) = stream.read_exact(&mut pdu).await {
            *guard = None;
            return Err(GatewayError::Read(format!("modbus pdu read failed: {e}")));
        }
        if codec::is_exception(&pdu) {
            return Err(GatewayError::Read(format!("modbus exception response: {pdu:02x?}")));
        }
        Ok(pdu)
    }
}

impl Default for ModbusTcpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolAdapter for ModbusTcpAdapter {
    async fn init(&self, config: &AdapterConfig) -> Result<()> {
        if let Some(ip) = config.get("ip") {
            *self.ip.lock() = ip.clone();
        }
        if let Some(port) = config.get("port").and_then(|p| p.parse::<u16>().ok()) {
            *self.port.lock() = port;
        }
        if let Some(slave) = config.get("slave_id").and_then(|s| s.parse::<u8>().ok()) {
            self.slave_id.store(slave, Ordering::SeqCst);
        }
        self.ensure_connected().await
    }

    async fn read(&self, _device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        self.read_batch(_device_id, "03", addresses).await
    }

    async fn read_batch(&self, _device_id: &str, function: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        let fc = codec::function_code(function)?;
        let groups = plan_groups(function, addresses)?;
        let mut out = Vec::with_capacity(addresses.len());
        let unit_id = self.slave_id.load(Ordering::SeqCst);

        for group in groups {
            let txn = self.next_transaction_id();
            let frame = codec::build_read_request(txn, unit_id, fc, group.start, group.quantity);

            let pdu = match self.roundtrip(&frame).await {
                Ok(pdu) => pdu,
                Err(e) => {
                    tracing::warn!("modbus group read {}..+{} failed: {e}", group.start, group.quantity);
                    for (point_id, _, _) in &group.members {
                        out.push(PointValue::bad(point_id.clone()));
                    }
                    continue;
                }
            };

            let words = if matches!(fc, codec::FC_READ_COILS | codec::FC_READ_DISCRETE) {
                codec::decode_bits_response(&pdu, group.quantity)
                    .map(|bits| bits.into_iter().map(|b| b as u16).collect::<Vec<u16>>())
            } else {
                codec::decode_registers_response(&pdu)
            };

            let words = match words {
                Ok(w) => w,
                Err(e) => {
                    tracing::warn!("modbus group decode {}..+{} failed: {e}", group.start, group.quantity);
                    for (point_id, _, _) in &group.members {
                        out.push(PointValue::bad(point_id.clone()));
                    }
                    continue;
                }
            };

            for (point_id, offset, span) in &group.members {
                let start = *offset as usize;
                let end = start + *span as usize;
                if end > words.len() {
                    out.push(PointValue::bad(point_id.clone()));
                    continue;
                }
                let slice = &words[start..end];
                let value = if slice.len() == 1 {
                    Value::UInt16(slice[0])
                } else {
                    Value::Words(slice.to_vec())
                };
                out.push(PointValue::good(point_id.clone(), value));
            }
        }
        Ok(out)
    }

    async fn write(&self, point_or_address: &str, value: Value) -> Result<()> {
        let unit_id = self.slave_id.load(Ordering::SeqCst);
        let txn = self.next_transaction_id();

        let frame = match value {
            Value::Bool(b) => {
                let address = parse_write_address(point_or_address, true)?;
                codec::build_write_coil_request(txn, unit_id, address, b)
            }
            Value::UInt16(u) => {
                let address = parse_write_address(point_or_address, false)?;
                codec::build_write_register_request(txn, unit_id, address, u)
            }
            Value::Int64(i) if (0..=u16::MAX as i64).contains(&i) => {
                let address = parse_write_address(point_or_address, false)?;
                codec::build_write_register_request(txn, unit_id, address, i as u16)
            }
            other => return Err(GatewayError::UnsupportedWriteType(format!("{other:?}"))),
        };

        self.roundtrip(&frame).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        *self.stream.lock().await = None;
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        self.close().await?;
        self.ensure_connected().await
    }

    fn set_unit_id(&self, unit_id: u8) {
        self.set_slave(unit_id);
    }
}
