//! Config-facing data model (spec §3 / §6): device descriptors, point
//! mappings, function groups. These are pure `serde`-deserializable
//! shapes; the config loader in the edge-gateway service parses them out
//! of `devices.yaml`/`points.yaml`, and the protocol adapters and rule
//! engine consume them read-only after boot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Declared point type (spec §3 Point mapping). Drives the point
/// mapper's final type-cast step (§4.3 step 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    Bool,
    Int,
    Float,
    String,
}

/// Inline alarm rule attached directly to a point mapping, per
/// `points.yaml`'s `alarm: {enable, condition, level, message}` shape
/// (spec §6). Promoted into a standalone `AlarmRule` by the config
/// loader when `enable` is true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmSpec {
    #[serde(default)]
    pub enable: bool,
    pub condition: String,
    pub level: String,
    pub message: String,
}

/// A single point binding: physical address -> logical name (spec §3
/// Point mapping).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointConfig {
    pub address: String,
    pub name: String,
    #[serde(rename = "type")]
    pub point_type: PointType,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub transform: Option<String>,
    #[serde(default)]
    pub alarm: Option<AlarmSpec>,
}

/// Points grouped under a function code (spec §3 Function group):
/// Modbus `"01"/"02"/"03"/"04"`, BACnet object-type string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionGroup {
    pub function: String,
    pub points: Vec<PointConfig>,
}

/// Device-level point configuration as loaded from `points.yaml` (spec
/// §6): one entry per device, each carrying its protocol tag and its
/// function groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicePoints {
    pub device_id: String,
    pub protocol: String,
    #[serde(default)]
    pub protocol_name: String,
    pub functions: Vec<FunctionGroup>,
}

/// Device descriptor (spec §3): identity, protocol tag, poll interval,
/// and an open-ended connection parameter mapping. Read-only after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub protocol: String,
    #[serde(default)]
    pub protocol_name: String,
    #[serde(default = "default_interval_secs")]
    pub interval: u64,
    #[serde(default)]
    pub enable_ping: bool,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub slave_id: Option<u8>,
    #[serde(default)]
    pub config: HashMap<String, String>,
}

fn default_interval_secs() -> u64 {
    5
}

impl DeviceDescriptor {
    /// Merges in values from `defaults` (a protocol-profile map) and
    /// `meta` (injected device-meta), only for keys not already present,
    /// per spec §3's three-source precedence: device-level overrides,
    /// protocol-profile defaults, then device-meta.
    pub fn merge_config(&mut self, profile_defaults: &HashMap<String, String>, meta: &HashMap<String, String>) {
        for (k, v) in profile_defaults {
            self.config.entry(k.clone()).or_insert_with(|| v.clone());
        }
        for (k, v) in meta {
            self.config.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if self.config.get("ip").is_none() {
            if let Some(ip) = &self.ip {
                self.config.insert("ip".to_string(), ip.clone());
            }
        }
        if self.config.get("port").is_none() {
            if let Some(port) = self.port {
                self.config.insert("port".to_string(), port.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_config_respects_precedence() {
        let mut d = DeviceDescriptor {
            id: "d1".into(),
            name: String::new(),
            description: String::new(),
            protocol: "modbus_tcp".into(),
            protocol_name: String::new(),
            interval: 5,
            enable_ping: false,
            ip: Some("10.0.0.1".into()),
            port: Some(502),
            slave_id: Some(1),
            config: HashMap::from([("timeout".to_string(), "2000".to_string())]),
        };
        let profile = HashMap::from([
            ("timeout".to_string(), "9999".to_string()),
            ("retries".to_string(), "3".to_string()),
        ]);
        let meta = HashMap::from([("retries".to_string(), "99".to_string())]);
        d.merge_config(&profile, &meta);

        // device-level override wins
        assert_eq!(d.config.get("timeout"), Some(&"2000".to_string()));
        // profile default fills the gap ahead of meta
        assert_eq!(d.config.get("retries"), Some(&"3".to_string()));
        assert_eq!(d.config.get("ip"), Some(&"10.0.0.1".to_string()));
    }
}
