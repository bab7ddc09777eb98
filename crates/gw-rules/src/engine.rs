//! Rule engine (spec §4.7): aggregate buffers, alarm evaluation, and
//! linkage dispatch over a device's current tick of point values.
//!
//! Grounded on the original's `RuleEngine`/`ApplyRules`/`PointBuffer`
//! (`original_source/edgecompute/rule_engine.go`), restructured into the
//! teacher's dedicated-module convention with `RwLock`-guarded rule
//! vectors swapped wholesale on reload (spec §9 Open Question: the
//! richer variant exposing `last_alarms` per apply, not as engine-wide
//! mutable state read out-of-band).

use std::collections::HashMap;
use std::sync::Arc;

use gw_common::NdjsonLog;
use gw_model::{evaluate_bool, Value};
use parking_lot::RwLock;
use serde_json::json;

use crate::buffer::PointBuffer;
use crate::types::{AggregateRule, AlarmInfo, AlarmRule, LinkageRule, WriteRequest};

/// Wholesale-replaceable set of the three rule vectors (spec §4.7
/// Reload: "atomic replacement of the three rule vectors").
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub aggregates: Vec<AggregateRule>,
    pub alarms: Vec<AlarmRule>,
    pub linkages: Vec<LinkageRule>,
}

/// Result of one `apply` call: the metrics produced by active aggregate
/// buffers, the alarms raised this tick, and any linkage writes to
/// dispatch to the client pool.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    pub metrics: HashMap<String, Value>,
    pub alarms: Vec<AlarmInfo>,
    pub writes: Vec<WriteRequest>,
}

/// Holds the three rule vectors plus the point-buffer map (spec §3
/// Point buffer). `rules` is behind a `RwLock` so reload (an exclusive
/// write) never blocks on readers mid-tick any longer than the copy
/// itself takes; `buffers` is keyed per point and outlives any reload
/// (spec §3 Lifecycles).
pub struct RuleEngine {
    rules: RwLock<Arc<RuleSet>>,
    buffers: RwLock<HashMap<String, PointBuffer>>,
    persist_log: Option<NdjsonLog>,
}

impl RuleEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: RwLock::new(Arc::new(rules)),
            buffers: RwLock::new(HashMap::new()),
            persist_log: None,
        }
    }

    /// Attaches the append-only `edge_rule.log` persistence sink (spec
    /// §4.7 step 5). Optional so unit tests don't need a filesystem.
    pub fn with_persist_log(mut self, log: NdjsonLog) -> Self {
        self.persist_log = Some(log);
        self
    }

    /// Atomically replaces the three rule vectors (spec §4.7 Reload).
    /// Buffers are untouched: an aggregate rule dropped by reload leaves
    /// its buffer inert rather than deleted.
    pub fn reload(&self, rules: RuleSet) {
        *self.rules.write() = Arc::new(rules);
    }

    pub fn rule_counts(&self) -> (usize, usize, usize) {
        let rules = self.rules.read();
        (rules.aggregates.len(), rules.alarms.len(), rules.linkages.len())
    }

    fn buffer_key(device_id: &str, point: &str) -> String {
        format!("{device_id}.{point}")
    }

    /// `apply(deviceId, pointMap)` (spec §4.7): runs the aggregate, alarm,
    /// and linkage stages in order and returns a fresh `ApplyOutcome`.
    /// `lastAlarms` is this outcome's `alarms` field, scoped to this one
    /// call rather than engine-wide mutable state (spec §9 Open
    /// Question).
    pub fn apply(&self, device_id: &str, point_map: &HashMap<String, Value>) -> ApplyOutcome {
        let rules = self.rules.read().clone();
        let mut outcome = ApplyOutcome::default();

        self.apply_aggregates(&rules, device_id, point_map, &mut outcome);
        self.apply_alarms(&rules, device_id, point_map, &mut outcome);
        self.apply_linkages(&rules, device_id, point_map, &mut outcome);
        self.persist(device_id, point_map);

        outcome
    }

    fn apply_aggregates(
        &self,
        rules: &RuleSet,
        device_id: &str,
        point_map: &HashMap<String, Value>,
        outcome: &mut ApplyOutcome,
    ) {
        let mut buffers = self.buffers.write();
        for rule in rules.aggregates.iter().filter(|r| r.device_id == device_id) {
            let Some(value) = point_map.get(&rule.point).and_then(Value::as_f64) else {
                continue;
            };
            let key = Self::buffer_key(device_id, &rule.point);
            let buffer = buffers.entry(key).or_insert_with(|| PointBuffer::new(rule.window));
            buffer.push(value);
            if let Some(agg) = buffer.compute(rule.method) {
                let metric_name = format!("{}_{}", rule.point, rule.method.as_str());
                outcome.metrics.insert(metric_name, Value::Float64(agg));
            }
        }
    }

    fn apply_alarms(
        &self,
        rules: &RuleSet,
        device_id: &str,
        point_map: &HashMap<String, Value>,
        outcome: &mut ApplyOutcome,
    ) {
        for rule in rules.alarms.iter().filter(|r| r.device_id == device_id) {
            let Some(value) = point_map.get(&rule.point).and_then(Value::as_f64) else {
                continue;
            };
            match evaluate_bool(&rule.condition, value) {
                Ok(true) => outcome.alarms.push(AlarmInfo {
                    name: rule.point.clone(),
                    level: rule.level,
                    message: rule.message.clone(),
                }),
                Ok(false) => {}
                Err(e) => tracing::warn!("alarm condition `{}` for {device_id}.{}: {e}", rule.condition, rule.point),
            }
        }
    }

    fn apply_linkages(
        &self,
        rules: &RuleSet,
        device_id: &str,
        point_map: &HashMap<String, Value>,
        outcome: &mut ApplyOutcome,
    ) {
        for rule in rules.linkages.iter().filter(|r| r.source_device == device_id) {
            let Some(value) = point_map.get(&rule.source_point).and_then(Value::as_f64) else {
                tracing::debug!("linkage source point `{}` not present on {device_id}, skipping", rule.source_point);
                continue;
            };
            match evaluate_bool(&rule.condition, value) {
                Ok(true) => outcome.writes.push(WriteRequest {
                    action_device: rule.action_device.clone(),
                    action_address: rule.action_address.clone(),
                    action_value: rule.action_value.clone(),
                }),
                Ok(false) => {}
                Err(e) => tracing::warn!("linkage condition `{}` for {device_id}.{}: {e}", rule.condition, rule.source_point),
            }
        }
    }

    /// §4.7 step 5: append a JSON line to `edge_rule.log`. Best-effort,
    /// never fails the tick.
    fn persist(&self, device_id: &str, point_map: &HashMap<String, Value>) {
        let Some(log) = &self.persist_log else { return };
        log.append(&json!({
            "device": device_id,
            "points": point_map,
            "ts": chrono::Utc::now().timestamp(),
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AggregateMethod;

    fn pm(pairs: &[(&str, f64)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), Value::Float64(*v))).collect()
    }

    #[test]
    fn aggregate_scenario_from_spec() {
        let engine = RuleEngine::new(RuleSet {
            aggregates: vec![AggregateRule {
                device_id: "d1".into(),
                point: "x".into(),
                method: AggregateMethod::Avg,
                window: 3,
                description: String::new(),
            }],
            alarms: vec![],
            linkages: vec![],
        });

        let expect = [10.0, 15.0, 20.0, 30.0];
        for (v, want) in [10.0, 20.0, 30.0, 40.0].into_iter().zip(expect) {
            let outcome = engine.apply("d1", &pm(&[("x", v)]));
            assert_eq!(outcome.metrics.get("x_avg"), Some(&Value::Float64(want)));
        }
    }

    #[test]
    fn alarm_scenario_from_spec() {
        let engine = RuleEngine::new(RuleSet {
            aggregates: vec![],
            alarms: vec![AlarmRule {
                device_id: "d1".into(),
                point: "temp".into(),
                condition: "value > 100".into(),
                level: crate::types::AlarmLevel::Warning,
                message: "hot".into(),
            }],
            linkages: vec![],
        });

        let hot = engine.apply("d1", &pm(&[("temp", 150.0)]));
        assert_eq!(hot.alarms.len(), 1);
        assert_eq!(hot.alarms[0].name, "temp");

        let cool = engine.apply("d1", &pm(&[("temp", 50.0)]));
        assert!(cool.alarms.is_empty());
    }

    #[test]
    fn linkage_scenario_from_spec() {
        let engine = RuleEngine::new(RuleSet {
            aggregates: vec![],
            alarms: vec![],
            linkages: vec![LinkageRule {
                source_device: "A".into(),
                source_point: "pressure".into(),
                condition: "value >= 10".into(),
                action_device: "B".into(),
                action_address: "40010".into(),
                action_value: json!(1),
            }],
        });

        let outcome = engine.apply("A", &pm(&[("pressure", 12.0)]));
        assert_eq!(outcome.writes.len(), 1);
        assert_eq!(outcome.writes[0].action_device, "B");
        assert_eq!(outcome.writes[0].action_address, "40010");
    }

    #[test]
    fn reload_preserves_buffer_contents() {
        let engine = RuleEngine::new(RuleSet {
            aggregates: vec![AggregateRule {
                device_id: "d1".into(),
                point: "x".into(),
                method: AggregateMethod::Avg,
                window: 5,
                description: String::new(),
            }],
            alarms: vec![],
            linkages: vec![],
        });
        engine.apply("d1", &pm(&[("x", 10.0)]));
        engine.apply("d1", &pm(&[("x", 20.0)]));

        // reload drops the aggregate rule entirely
        engine.reload(RuleSet::default());
        assert_eq!(engine.rule_counts(), (0, 0, 0));

        // but the buffer survives; re-adding the same rule resumes from it
        engine.reload(RuleSet {
            aggregates: vec![AggregateRule {
                device_id: "d1".into(),
                point: "x".into(),
                method: AggregateMethod::Avg,
                window: 5,
                description: String::new(),
            }],
            alarms: vec![],
            linkages: vec![],
        });
        let outcome = engine.apply("d1", &pm(&[("x", 30.0)]));
        assert_eq!(outcome.metrics.get("x_avg"), Some(&Value::Float64(20.0)));
    }

    #[test]
    fn unknown_point_is_silently_skipped() {
        let engine = RuleEngine::new(RuleSet {
            aggregates: vec![],
            alarms: vec![AlarmRule {
                device_id: "d1".into(),
                point: "missing".into(),
                condition: "value > 1".into(),
                level: crate::types::AlarmLevel::Info,
                message: "m".into(),
            }],
            linkages: vec![],
        });
        let outcome = engine.apply("d1", &pm(&[("other", 5.0)]));
        assert!(outcome.alarms.is_empty());
    }
}
