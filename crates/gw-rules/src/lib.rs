//! Edge rule engine (spec §4.7): sliding-window aggregators, alarm
//! evaluation, and linkage dispatch, with runtime reload.
//!
//! Grounded on `original_source/edgecompute/rule_engine.go`, restructured
//! into the teacher's module layout (typed rule structs, `RwLock`-guarded
//! rule vectors, explicit per-apply outcome rather than engine-wide
//! mutable `lastAlarms`, per spec §9 Open Question).

pub mod buffer;
pub mod engine;
pub mod loader;
pub mod types;

pub use buffer::PointBuffer;
pub use engine::{ApplyOutcome, RuleEngine, RuleSet};
pub use loader::load_ruleset;
pub use types::{
    AggregateMethod, AggregateRule, AlarmInfo, AlarmLevel, AlarmRule, DeviceRuleSet, LinkageRule,
    WriteRequest,
};
