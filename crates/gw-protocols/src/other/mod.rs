//! S7, SLMP, SNMP, raw TCP and HTTP adapters (spec §4.4.3): same
//! `ProtocolAdapter` contract as Modbus/BACnet, but single-point-per-op
//! read logic — none of these carry a batch-read planner.

mod http;
mod s7;
mod slmp;
mod snmp;
mod tcp;

pub use http::HttpAdapter;
pub use s7::S7Adapter;
pub use slmp::SlmpAdapter;
pub use snmp::SnmpAdapter;
pub use tcp::TcpAdapter;
