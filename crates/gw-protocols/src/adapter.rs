//! Protocol adapter contract (spec §4.4).
//!
//! Every protocol driver (Modbus/TCP, BACnet/IP, S7, SLMP, SNMP, raw TCP,
//! HTTP) implements the same narrow surface. The client pool (§4.5) and
//! acquisition scheduler (§4.6) only ever talk to `dyn ProtocolAdapter`;
//! they never know which wire protocol is underneath.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gw_errors::Result;
use gw_model::Value;
use std::collections::HashMap;

/// Read/write quality flag attached to every point value (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Good,
    Bad,
}

/// A single point's value as produced by a protocol adapter, prior to
/// point-mapper processing. `value` is `None` when `quality == Bad`.
#[derive(Debug, Clone)]
pub struct PointValue {
    pub point_id: String,
    pub value: Option<Value>,
    pub quality: Quality,
    pub timestamp: DateTime<Utc>,
}

impl PointValue {
    pub fn good(point_id: impl Into<String>, value: Value) -> Self {
        Self {
            point_id: point_id.into(),
            value: Some(value),
            quality: Quality::Good,
            timestamp: Utc::now(),
        }
    }

    pub fn bad(point_id: impl Into<String>) -> Self {
        Self {
            point_id: point_id.into(),
            value: None,
            quality: Quality::Bad,
            timestamp: Utc::now(),
        }
    }
}

/// A single addressable point as the planner/adapter needs to see it:
/// enough to compute a read span and to slice/decode the eventual raw
/// response (spec §4.4.1).
#[derive(Debug, Clone)]
pub struct AddressSpec {
    pub point_id: String,
    pub address: String,
    /// Raw word width of this point's value (1/2/4 for Modbus), used by
    /// the batch-read planner to compute spans. Adapters that read one
    /// point per operation ignore this.
    pub word_width: usize,
}

/// Connection parameters handed to `init`/`reconnect`. Adapters pull out
/// the keys they need (`ip`, `port`, `slave_id`, timeouts, ...) from the
/// device descriptor's merged `config` map (spec §3).
pub type AdapterConfig = HashMap<String, String>;

/// Capability interface every protocol driver implements (spec §4.4).
///
/// `init`/`reconnect` take `&self`, not `&mut self`: the client pool
/// stores adapters as `Arc<dyn ProtocolAdapter>` (design notes §9,
/// "client pool stores boxed instances"), so mutable state lives behind
/// each adapter's own interior-mutability guard (a `parking_lot::Mutex`
/// or `tokio::sync::RwLock` around its transport handle), not behind a
/// pool-wide `&mut`.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    async fn init(&self, config: &AdapterConfig) -> Result<()>;

    /// Single-point-per-op read, used by adapters without a batch
    /// planner (S7, SLMP, SNMP, TCP, HTTP, BACnet).
    async fn read(&self, device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>>;

    /// Function-code-parameterized batch read (spec §9 Open Question:
    /// the richer scheduler variant). Modbus overrides this with the
    /// grouped-read planner (§4.4.1); other adapters default to `read`.
    async fn read_batch(
        &self,
        device_id: &str,
        function: &str,
        addresses: &[AddressSpec],
    ) -> Result<Vec<PointValue>> {
        let _ = function;
        self.read(device_id, addresses).await
    }

    async fn write(&self, point_or_address: &str, value: Value) -> Result<()>;

    async fn close(&self) -> Result<()>;

    async fn reconnect(&self) -> Result<()>;

    /// Re-asserts the slave/unit id before a group of reads (spec
    /// §4.4.1: "mutable at runtime ... the planner re-asserts it before
    /// every group"). A no-op for every adapter except Modbus/TCP, where
    /// several devices can share one TCP endpoint under distinct RTU
    /// unit ids.
    fn set_unit_id(&self, _unit_id: u8) {}

    /// Registers a device's configured points ahead of scheduling (spec
    /// §4.4.2: "called once at boot, before scheduling starts"). A no-op
    /// for every adapter except BACnet/IP, which builds its three-index
    /// point table from here instead of resolving addresses per-read.
    async fn register_points(&self, _device_id: &str, _points: &[gw_model::descriptor::PointConfig]) -> Result<()> {
        Ok(())
    }
}
