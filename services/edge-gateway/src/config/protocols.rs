//! `protocols.yaml` (spec §6): `map protocol -> [profile]`, each profile
//! naming parameters merged into a device's `config` map (spec §3's
//! middle precedence tier, behind device-level overrides, ahead of
//! injected device-meta).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolProfile {
    pub name: String,
    #[serde(flatten)]
    pub config: HashMap<String, String>,
}

pub type ProtocolsFile = HashMap<String, Vec<ProtocolProfile>>;

/// Looks up `profile_name` within `protocol`'s profile list. Devices that
/// don't name a profile (or name one that doesn't exist) simply get no
/// profile defaults, per spec §3's "only keys not already present" merge
/// (an empty default map is a no-op).
pub fn find_profile<'a>(profiles: &'a ProtocolsFile, protocol: &str, profile_name: &str) -> Option<&'a HashMap<String, String>> {
    profiles
        .get(protocol)?
        .iter()
        .find(|p| p.name == profile_name)
        .map(|p| &p.config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_named_profile_within_protocol() {
        let yaml = r#"
modbus_tcp:
  - name: default
    timeout: "2000"
  - name: fast
    timeout: "500"
"#;
        let profiles: ProtocolsFile = serde_yaml::from_str(yaml).unwrap();
        let found = find_profile(&profiles, "modbus_tcp", "fast").unwrap();
        assert_eq!(found.get("timeout"), Some(&"500".to_string()));
        assert!(find_profile(&profiles, "modbus_tcp", "missing").is_none());
    }
}
