//! Uplink fan-out (spec §4.8): the per-channel send contract, each
//! supported channel (MQTT, HTTP, Kafka, NATS, Redis, Sparkplug B), the
//! data report envelope/encoder, and the parallel fan-out manager.

pub mod channel;
pub mod config;
pub mod http;
pub mod kafka;
pub mod manager;
pub mod mqtt;
pub mod nats;
pub mod redis_uplink;
pub mod report;
pub mod sparkplugb;

pub use channel::UplinkChannel;
pub use config::UplinkConfig;
pub use manager::UplinkManager;
pub use report::DataReport;
