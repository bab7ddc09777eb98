//! Uplink channel configuration, loaded from `uplinks.yaml` (spec §6):
//! `{type, name, enable, ...channel-specific fields}`.
//!
//! Modeled as a `serde`-internally-tagged enum on `type` rather than the
//! original's flat struct-plus-switch (`original_source/uplink/uplink.go`'s
//! `UplinkFactory.NewUplink`), since an internally tagged enum lets
//! `serde_yaml` reject a config entry whose fields don't match its
//! declared type at load time instead of silently defaulting them.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UplinkConfig {
    Mqtt(MqttConfig),
    Http(HttpConfig),
    Kafka(KafkaConfig),
    Nats(NatsConfig),
    Redis(RedisConfig),
    #[serde(rename = "sparkplugb")]
    SparkplugB(SparkplugBConfig),
}

impl UplinkConfig {
    pub fn name(&self) -> &str {
        match self {
            UplinkConfig::Mqtt(c) => &c.name,
            UplinkConfig::Http(c) => &c.name,
            UplinkConfig::Kafka(c) => &c.name,
            UplinkConfig::Nats(c) => &c.name,
            UplinkConfig::Redis(c) => &c.name,
            UplinkConfig::SparkplugB(c) => &c.name,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            UplinkConfig::Mqtt(c) => c.enable,
            UplinkConfig::Http(c) => c.enable,
            UplinkConfig::Kafka(c) => c.enable,
            UplinkConfig::Nats(c) => c.enable,
            UplinkConfig::Redis(c) => c.enable,
            UplinkConfig::SparkplugB(c) => c.enable,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    pub broker: String,
    pub client_id: String,
    pub topic: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_method() -> String {
    "POST".to_string()
}

impl HttpConfig {
    /// 5-second total timeout (spec §4.8 / §5).
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    pub brokers: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NatsConfig {
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    pub url: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    pub url: String,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkplugBConfig {
    pub name: String,
    #[serde(default)]
    pub enable: bool,
    pub broker: String,
    pub client_id: String,
    pub group_id: String,
    pub node_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_channel_list() {
        let yaml = r#"
- type: mqtt
  name: primary
  enable: true
  broker: "tcp://localhost:1883"
  client_id: gw-1
  topic: "edge/reports"
- type: http
  name: rest-sink
  enable: false
  url: "https://example.com/ingest"
"#;
        let cfgs: Vec<UplinkConfig> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfgs.len(), 2);
        assert_eq!(cfgs[0].name(), "primary");
        assert!(cfgs[0].enabled());
        assert!(!cfgs[1].enabled());
    }
}
