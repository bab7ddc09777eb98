//! Config loading (spec §6): `devices.yaml`, `protocols.yaml`,
//! `points.yaml`, `edge_rules.yaml`, `uplinks.yaml`, all at fixed paths
//! under a `configs/` directory.
//!
//! Grounded on `libs/common/src/config_loader.rs`'s layered-merge
//! pattern, generalized here to the gateway's three-source device
//! config precedence (spec §3): device-level overrides, protocol-profile
//! defaults, injected device-meta.

pub mod meta;
pub mod protocols;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gw_common::load_yaml;
use gw_errors::Result;
use gw_model::descriptor::DevicePoints;
use gw_model::DeviceDescriptor;
use gw_rules::RuleSet;
use gw_uplink::UplinkConfig;

use protocols::ProtocolsFile;

/// Every config file loaded at boot, already cross-merged (spec §9
/// Design Notes: config errors at load are fatal).
pub struct GatewayConfig {
    pub devices: Vec<DeviceDescriptor>,
    pub points: Vec<DevicePoints>,
    pub rules: RuleSet,
    pub uplinks: Vec<UplinkConfig>,
    pub edge_rules_path: PathBuf,
}

impl GatewayConfig {
    /// Loads all five config files from `dir` and applies the three-tier
    /// merge described in spec §3 to every device descriptor's `config`
    /// map: device-level overrides win, then the named protocol profile,
    /// then gateway-wide device-meta fills any remaining gaps.
    pub fn load(dir: impl AsRef<Path>, gateway_id: &str) -> Result<Self> {
        let dir = dir.as_ref();

        let mut devices: Vec<DeviceDescriptor> = load_yaml(dir.join("devices.yaml"))?;
        let profiles: ProtocolsFile = load_yaml(dir.join("protocols.yaml"))?;
        let points: Vec<DevicePoints> = load_yaml(dir.join("points.yaml"))?;
        let edge_rules_path = dir.join("edge_rules.yaml");
        let rules = gw_rules::load_ruleset(&edge_rules_path)?;
        let uplinks: Vec<UplinkConfig> = load_yaml(dir.join("uplinks.yaml"))?;

        let device_meta = meta::build_device_meta(gateway_id);
        let empty: HashMap<String, String> = HashMap::new();
        for device in &mut devices {
            let profile_defaults = protocols::find_profile(&profiles, &device.protocol, &device.protocol_name).unwrap_or(&empty);
            device.merge_config(profile_defaults, &device_meta);
        }

        Ok(Self {
            devices,
            points,
            rules,
            uplinks,
            edge_rules_path,
        })
    }

    /// The point configuration for `device_id`, if present in
    /// `points.yaml`.
    pub fn points_for(&self, device_id: &str) -> Option<&DevicePoints> {
        self.points.iter().find(|p| p.device_id == device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn loads_and_merges_device_config() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "devices.yaml",
            r#"
- id: d1
  protocol: modbus_tcp
  protocol_name: default
  ip: "10.0.0.5"
  port: 502
  config:
    timeout: "1000"
"#,
        );
        write(
            dir.path(),
            "protocols.yaml",
            r#"
modbus_tcp:
  - name: default
    timeout: "9999"
    retries: "7"
"#,
        );
        write(dir.path(), "points.yaml", "[]");
        write(dir.path(), "edge_rules.yaml", "[]");
        write(dir.path(), "uplinks.yaml", "[]");

        let config = GatewayConfig::load(dir.path(), "gw-1").unwrap();
        let d1 = &config.devices[0];
        assert_eq!(d1.config.get("timeout"), Some(&"1000".to_string())); // device override wins
        assert_eq!(d1.config.get("retries"), Some(&"7".to_string())); // profile fills the gap
        assert_eq!(d1.config.get("ip"), Some(&"10.0.0.5".to_string()));
        assert_eq!(d1.config.get("gateway_id"), Some(&"gw-1".to_string())); // device-meta last
    }
}
