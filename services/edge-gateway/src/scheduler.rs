//! Acquisition scheduler (spec §4.6): one periodic task per (device,
//! function group). Each tick asserts the slave/unit id, batch-reads
//! with retry, maps every returned value through the point mapper,
//! invokes the rule engine, and fans the encoded report out to every
//! uplink.
//!
//! Grounded on `services/comsrv/src/core/protocols/common/polling.rs`'s
//! `tokio::spawn` + `tokio::time::interval` loop shape and, per spec §9
//! Open Question, the original's richest scheduler variant
//! (`StartSchedulerWithRuleEngineAndUplink`): function-code-parameterized
//! batch read, explicit per-tick alarm collection, full rule-engine and
//! uplink wiring.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use gw_common::StopToken;
use gw_model::descriptor::{FunctionGroup, PointConfig};
use gw_model::{format::FormatTag, mapper, DeviceDescriptor, Value};
use gw_protocols::{AddressSpec, AdapterConfig, ClientKey, ClientPool, Quality};
use gw_rules::RuleEngine;
use gw_uplink::{DataReport, UplinkManager};
use serde_json::Value as JsonValue;
use tokio::time::interval;

const READ_RETRY_ATTEMPTS: u32 = 3;
const READ_RETRY_BACKOFF: Duration = Duration::from_secs(2);

pub struct SchedulerTask {
    pub device: DeviceDescriptor,
    pub function: FunctionGroup,
    pub pool: Arc<ClientPool>,
    pub rule_engine: Arc<RuleEngine>,
    pub uplinks: Arc<UplinkManager>,
    pub devices_by_id: Arc<HashMap<String, DeviceDescriptor>>,
    pub stop: StopToken,
}

impl SchedulerTask {
    /// Runs the tick loop until `stop` fires (spec §5 Cancellation).
    pub async fn run(mut self) {
        let mut ticker = interval(Duration::from_secs(self.device.interval.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = self.stop.cancelled() => {
                    tracing::info!("scheduler task for {}/{} stopping", self.device.id, self.function.function);
                    return;
                }
            }
            self.tick().await;
        }
    }

    async fn tick(&mut self) {
        let key = client_key(&self.device);
        let adapter_config: AdapterConfig = self.device.config.clone();

        let client = match self.pool.get_or_create(&key, &adapter_config).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("device {}: client unavailable: {e}", self.device.id);
                self.run_rules_and_fan_out(HashMap::new()).await;
                return;
            }
        };

        // spec §4.6 step 1: assert slave/unit id (no-op on non-Modbus adapters).
        client.set_unit_id(self.device.slave_id.unwrap_or(1));

        let addresses = point_addresses(&self.function.points);

        // spec §4.6 step 3: up to 3 attempts, 2s fixed backoff, return on
        // first success.
        let mut result = None;
        for attempt in 1..=READ_RETRY_ATTEMPTS {
            match client.read_batch(&self.device.id, &self.function.function, &addresses).await {
                Ok(values) => {
                    result = Some(values);
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        "device {} function {} read attempt {attempt}/{READ_RETRY_ATTEMPTS} failed: {e}",
                        self.device.id,
                        self.function.function
                    );
                    if attempt < READ_RETRY_ATTEMPTS {
                        tokio::time::sleep(READ_RETRY_BACKOFF).await;
                    }
                }
            }
        }

        let point_values = result.unwrap_or_default();
        let point_map = map_readings(&self.function.points, &point_values);
        self.run_rules_and_fan_out(point_map).await;
    }

    async fn run_rules_and_fan_out(&self, point_map: HashMap<String, Value>) {
        // spec §4.6 step 4: the presence invariant holds even when the
        // read failed entirely: every configured point is seeded, `nil`
        // if unreadable.
        let mut data: HashMap<String, JsonValue> = self
            .function
            .points
            .iter()
            .map(|p| (p.name.clone(), JsonValue::Null))
            .collect();
        for (name, value) in &point_map {
            if let Ok(json) = serde_json::to_value(value) {
                data.insert(name.clone(), json);
            }
        }

        let outcome = self.rule_engine.apply(&self.device.id, &point_map);

        let metrics: HashMap<String, JsonValue> = outcome
            .metrics
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|j| (k.clone(), j)))
            .collect();

        let report = DataReport::new(self.device.id.clone(), data, outcome.alarms, metrics);
        self.uplinks.send_to_all(&report.encode()).await;

        for write in outcome.writes {
            self.dispatch_write(write).await;
        }
    }

    async fn dispatch_write(&self, write: gw_rules::WriteRequest) {
        let Some(target) = self.devices_by_id.get(&write.action_device) else {
            tracing::warn!("linkage write targets unknown device `{}`", write.action_device);
            return;
        };
        let key = client_key(target);
        let adapter_config: AdapterConfig = target.config.clone();
        let client = match self.pool.get_or_create(&key, &adapter_config).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!("linkage write to {}: client unavailable: {e}", write.action_device);
                return;
            }
        };
        let value = json_to_gw_value(&write.action_value);
        if let Err(e) = client.write(&write.action_address, value).await {
            tracing::warn!("linkage write to {}.{} failed: {e}", write.action_device, write.action_address);
        }
    }
}

pub(crate) fn client_key(device: &DeviceDescriptor) -> ClientKey {
    let ip = device.config.get("ip").cloned().unwrap_or_default();
    let port = device
        .config
        .get("port")
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(|| default_port(&device.protocol));
    ClientKey::new(device.protocol.clone(), ip, port)
}

fn default_port(protocol: &str) -> u16 {
    match protocol {
        "modbus_tcp" => 502,
        "bacnet" => 47808,
        _ => 0,
    }
}

/// Builds the planner-facing address list for one function group (spec
/// §4.4.1 step 2): each point's raw word span comes from its format tag,
/// defaulting to a single word when no format is declared.
fn point_addresses(points: &[PointConfig]) -> Vec<AddressSpec> {
    points
        .iter()
        .map(|p| AddressSpec {
            point_id: p.name.clone(),
            address: p.address.clone(),
            word_width: p
                .format
                .as_deref()
                .and_then(|f| FormatTag::parse(f).ok())
                .map(|tag| tag.word_width())
                .unwrap_or(1),
        })
        .collect()
}

/// §4.6 step 5: matches each returned value by point name (address
/// spec's `point_id` is the point name, spec §9's simplification) and
/// applies the point mapper (§4.3).
fn map_readings(points: &[PointConfig], values: &[gw_protocols::PointValue]) -> HashMap<String, Value> {
    let mut out = HashMap::with_capacity(points.len());
    for point in points {
        let Some(point_value) = values.iter().find(|v| v.point_id == point.name) else {
            continue;
        };
        if point_value.quality != Quality::Good {
            continue;
        }
        let Some(raw_value) = point_value.value.clone() else { continue };

        let format = point.format.as_deref().and_then(|f| FormatTag::parse(f).ok());
        let reading = mapper::RawReading {
            value: raw_value,
            format,
            transform: point.transform.clone(),
            declared_type: point.point_type,
        };
        out.insert(point.name.clone(), mapper::map_reading(&reading));
    }
    out
}

fn json_to_gw_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int64(i)
            } else {
                Value::Float64(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::String(s) => Value::Str(s.clone()),
        other => Value::Str(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_model::descriptor::PointType;

    #[test]
    fn default_ports_match_known_protocols() {
        assert_eq!(default_port("modbus_tcp"), 502);
        assert_eq!(default_port("bacnet"), 47808);
        assert_eq!(default_port("http"), 0);
    }

    #[test]
    fn point_addresses_default_to_one_word() {
        let points = vec![PointConfig {
            address: "40001".into(),
            name: "p1".into(),
            point_type: PointType::Int,
            unit: String::new(),
            format: None,
            transform: None,
            alarm: None,
        }];
        let specs = point_addresses(&points);
        assert_eq!(specs[0].word_width, 1);
    }

    #[test]
    fn json_to_gw_value_preserves_int_vs_float() {
        assert_eq!(json_to_gw_value(&serde_json::json!(1)), Value::Int64(1));
        assert_eq!(json_to_gw_value(&serde_json::json!(1.5)), Value::Float64(1.5));
        assert_eq!(json_to_gw_value(&serde_json::json!(true)), Value::Bool(true));
    }
}
