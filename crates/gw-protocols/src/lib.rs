//! Protocol adapter layer (spec §4.4): the shared adapter contract, the
//! client pool, and each protocol driver (Modbus/TCP, BACnet/IP, S7,
//! SLMP, SNMP, raw TCP, HTTP).

pub mod adapter;
pub mod bacnet;
pub mod modbus;
pub mod other;
pub mod pool;
pub mod registry;

#[cfg(test)]
mod testing;

pub use adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter, Quality};
pub use pool::{ClientKey, ClientPool};
pub use registry::ProtocolRegistry;
