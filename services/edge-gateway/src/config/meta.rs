//! Injected device-meta: the lowest-precedence tier of a device's merged
//! `config` map (spec §3), filled in from gateway-wide ambient facts
//! rather than a per-device file. Only keys a device hasn't already set
//! (directly or via its protocol profile) are filled in.

use std::collections::HashMap;

/// Builds the gateway-wide device-meta map: the local hostname (falling
/// back to `"edge-gateway"` when it can't be read) and a fixed gateway
/// identity tag. Both are unconditionally safe defaults for any
/// connection-parameter key a device config might otherwise be missing.
pub fn build_device_meta(gateway_id: &str) -> HashMap<String, String> {
    let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "edge-gateway".to_string());

    HashMap::from([
        ("gateway_id".to_string(), gateway_id.to_string()),
        ("gateway_host".to_string(), hostname),
        ("timeout".to_string(), "5000".to_string()),
        ("retries".to_string(), "3".to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_expected_keys() {
        let meta = build_device_meta("gw-1");
        assert_eq!(meta.get("gateway_id"), Some(&"gw-1".to_string()));
        assert!(meta.contains_key("gateway_host"));
    }
}
