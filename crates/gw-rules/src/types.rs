//! Rule descriptor types (spec §3): aggregate, alarm, and linkage rules,
//! as loaded from `edge_rules.yaml`, plus the values the engine produces
//! each tick.

use serde::{Deserialize, Serialize};

/// Aggregate rule (spec §3): emits an aggregate value to the current
/// tick's outbound metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRule {
    pub device_id: String,
    pub point: String,
    pub method: AggregateMethod,
    pub window: usize,
    #[serde(default)]
    pub description: String,
}

/// Aggregation method. Only `avg` is required by spec §3; the buffer
/// itself is extensible to `min/max/sum` (spec §3 Point buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateMethod {
    Avg,
    Min,
    Max,
    Sum,
}

impl AggregateMethod {
    /// Metric-name suffix (spec §4.6 step 7: `"<point>_avg"` for the
    /// required `avg` method, generalized the same way for the
    /// extensible `min/max/sum` methods).
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateMethod::Avg => "avg",
            AggregateMethod::Min => "min",
            AggregateMethod::Max => "max",
            AggregateMethod::Sum => "sum",
        }
    }
}

/// Alarm severity (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmLevel {
    Info,
    Warning,
    Critical,
}

/// Alarm rule (spec §3): produces an `AlarmInfo` when `condition`
/// evaluates to boolean true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmRule {
    pub device_id: String,
    pub point: String,
    pub condition: String,
    pub level: AlarmLevel,
    pub message: String,
}

/// Linkage rule (spec §3): when triggered, requests a write on the
/// action device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkageRule {
    pub source_device: String,
    pub source_point: String,
    pub condition: String,
    pub action_device: String,
    pub action_address: String,
    pub action_value: serde_json::Value,
}

/// Produced by the alarm stage of `apply` (spec §3 Data report
/// envelope's `alarm` array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmInfo {
    pub name: String,
    pub level: AlarmLevel,
    pub message: String,
}

/// Produced by the linkage stage of `apply`: a write request destined
/// for the client pool (spec §4.7 step 4).
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub action_device: String,
    pub action_address: String,
    pub action_value: serde_json::Value,
}

/// Loader shape for one `edge_rules.yaml` entry (spec §6): all three
/// rule kinds scoped to a single device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRuleSet {
    pub device_id: String,
    #[serde(default)]
    pub aggregate: Vec<AggregateRuleSpec>,
    #[serde(default)]
    pub alarm: Vec<AlarmRuleSpec>,
    #[serde(default)]
    pub linkage: Vec<LinkageRuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateRuleSpec {
    pub point: String,
    pub method: AggregateMethod,
    pub window: usize,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmRuleSpec {
    pub point: String,
    pub condition: String,
    pub level: AlarmLevel,
    pub message: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkageRuleSpec {
    pub source_point: String,
    pub condition: String,
    pub action_device: String,
    pub action_address: String,
    pub action_value: serde_json::Value,
    #[serde(default)]
    pub description: String,
}

/// Flattens a set of `DeviceRuleSet`s (as loaded from `edge_rules.yaml`)
/// into the three independent rule vectors the engine operates on.
pub fn flatten(device_rule_sets: Vec<DeviceRuleSet>) -> (Vec<AggregateRule>, Vec<AlarmRule>, Vec<LinkageRule>) {
    let mut aggregates = Vec::new();
    let mut alarms = Vec::new();
    let mut linkages = Vec::new();

    for set in device_rule_sets {
        for a in set.aggregate {
            aggregates.push(AggregateRule {
                device_id: set.device_id.clone(),
                point: a.point,
                method: a.method,
                window: a.window,
                description: a.description,
            });
        }
        for a in set.alarm {
            alarms.push(AlarmRule {
                device_id: set.device_id.clone(),
                point: a.point,
                condition: a.condition,
                level: a.level,
                message: a.message,
            });
        }
        for l in set.linkage {
            linkages.push(LinkageRule {
                source_device: set.device_id.clone(),
                source_point: l.source_point,
                condition: l.condition,
                action_device: l.action_device,
                action_address: l.action_address,
                action_value: l.action_value,
            });
        }
    }

    (aggregates, alarms, linkages)
}
