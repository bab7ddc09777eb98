//! Modbus/TCP adapter (spec §4.4.1): the batch-read planner, the wire
//! client, and the `ProtocolAdapter` implementation tying them together.

mod client;
pub mod codec;
mod planner;

pub use client::ModbusTcpAdapter;
pub use planner::{plan_groups, ReadGroup};
