//! HTTP adapter (spec §4.4.3): polls a URL per point, interprets the
//! response body as JSON, and extracts a value via a configurable dotted
//! field path. Carries a `mock` feature (spec §9 Open Question: the
//! source's MOCK branch was wired into production; here it's gated
//! behind a dev-only Cargo feature) that returns synthetic values keyed
//! by `deviceId` instead of making a request.

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use gw_model::Value;
use tokio::sync::Mutex;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};

pub struct HttpAdapter {
    base_url: Mutex<String>,
    client: reqwest::Client,
}

impl HttpAdapter {
    pub fn new() -> Self {
        Self {
            base_url: Mutex::new(String::new()),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .expect("reqwest client builds with static config"),
        }
    }

    fn extract_field(body: &serde_json::Value, field_path: &str) -> Option<serde_json::Value> {
        let mut cur = body;
        for segment in field_path.split('.') {
            cur = cur.get(segment)?;
        }
        Some(cur.clone())
    }

    fn json_to_value(json: &serde_json::Value) -> Option<Value> {
        match json {
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Float64),
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            _ => None,
        }
    }

    #[cfg(feature = "mock")]
    fn mock_value(device_id: &str, address: &str) -> Value {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut hasher = DefaultHasher::new();
        device_id.hash(&mut hasher);
        address.hash(&mut hasher);
        let n = (hasher.finish() % 1000) as f64 / 10.0;
        Value::Float64(n)
    }
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProtocolAdapter for HttpAdapter {
    async fn init(&self, config: &AdapterConfig) -> Result<()> {
        if let Some(url) = config.get("url").or_else(|| config.get("ip")) {
            *self.base_url.lock().await = url.clone();
        }
        Ok(())
    }

    async fn read(&self, device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        #[cfg(feature = "mock")]
        {
            return Ok(addresses
                .iter()
                .map(|a| PointValue::good(a.point_id.clone(), Self::mock_value(device_id, &a.address)))
                .collect());
        }

        #[cfg(not(feature = "mock"))]
        {
            let base_url = self.base_url.lock().await.clone();
            let mut out = Vec::with_capacity(addresses.len());
            for spec in addresses {
                match self.client.get(&base_url).send().await {
                    Ok(resp) if (200..300).contains(&resp.status().as_u16()) => {
                        match resp.json::<serde_json::Value>().await {
                            Ok(body) => {
                                let field = Self::extract_field(&body, &spec.address);
                                match field.as_ref().and_then(Self::json_to_value) {
                                    Some(value) => out.push(PointValue::good(spec.point_id.clone(), value)),
                                    None => out.push(PointValue::bad(spec.point_id.clone())),
                                }
                            }
                            Err(_) => out.push(PointValue::bad(spec.point_id.clone())),
                        }
                    }
                    _ => out.push(PointValue::bad(spec.point_id.clone())),
                }
            }
            let _ = device_id;
            Ok(out)
        }
    }

    async fn write(&self, _point_or_address: &str, _value: Value) -> Result<()> {
        Err(GatewayError::UnsupportedWriteType("http adapter is read-only".into()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_field_navigates_dotted_path() {
        let body: serde_json::Value = serde_json::json!({"data": {"temperature": 21.5}});
        let extracted = HttpAdapter::extract_field(&body, "data.temperature").unwrap();
        assert_eq!(extracted, serde_json::json!(21.5));
    }

    #[test]
    fn extract_field_missing_path_is_none() {
        let body: serde_json::Value = serde_json::json!({"data": {}});
        assert!(HttpAdapter::extract_field(&body, "data.missing").is_none());
    }

    #[test]
    fn json_to_value_converts_scalars() {
        assert_eq!(HttpAdapter::json_to_value(&serde_json::json!(true)), Some(Value::Bool(true)));
        assert_eq!(HttpAdapter::json_to_value(&serde_json::json!(1.5)), Some(Value::Float64(1.5)));
        assert_eq!(
            HttpAdapter::json_to_value(&serde_json::json!("x")),
            Some(Value::Str("x".to_string()))
        );
    }
}
