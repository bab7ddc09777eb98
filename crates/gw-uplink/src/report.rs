//! Data report envelope (spec §3 / §6) and its JSON encoder.
//!
//! Grounded on `original_source/uplink/encoder.go`'s `EncodeDataReport`.
//! JSON is the encoding for every uplink channel unless a channel
//! overrides it (spec §3): none of the channels below do, so `encode`
//! lives here rather than per-channel.

use std::collections::HashMap;

use chrono::Utc;
use gw_rules::AlarmInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `{deviceId, timestamp, data, alarm?, metrics?}` (spec §3 Data report
/// envelope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataReport {
    pub device_id: String,
    pub timestamp: i64,
    pub data: HashMap<String, JsonValue>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub alarm: Vec<AlarmInfo>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub metrics: HashMap<String, JsonValue>,
}

impl DataReport {
    pub fn new(
        device_id: impl Into<String>,
        data: HashMap<String, JsonValue>,
        alarm: Vec<AlarmInfo>,
        metrics: HashMap<String, JsonValue>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: Utc::now().timestamp(),
            data,
            alarm,
            metrics,
        }
    }

    /// Serializes to the bytes every uplink channel sends (spec §3).
    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_rules::AlarmLevel;

    #[test]
    fn encodes_expected_json_shape() {
        let mut data = HashMap::new();
        data.insert("temp".to_string(), serde_json::json!(150.0));
        let report = DataReport::new(
            "d1",
            data,
            vec![AlarmInfo {
                name: "temp".into(),
                level: AlarmLevel::Warning,
                message: "hot".into(),
            }],
            HashMap::new(),
        );
        let encoded = report.encode();
        let parsed: JsonValue = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(parsed["device_id"], "d1");
        assert_eq!(parsed["alarm"][0]["level"], "warning");
        assert!(parsed.get("metrics").is_none());
    }
}
