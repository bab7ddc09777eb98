//! Dynamic per-point value.
//!
//! The original implementation carries an untyped `interface{}`/`any`
//! through the pipeline. Rather than reach for a generic dynamic-dispatch
//! value (`Box<dyn Any>`), we model the closed set of shapes the pipeline
//! actually produces as a tagged enum, per the design notes: readings come
//! back from protocol adapters as scalars or raw register words, get
//! decoded/transformed/cast, and end up as JSON-serializable scalars in the
//! outbound report.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int64(i64),
    UInt16(u16),
    UInt32(u32),
    Float64(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Raw multi-word register vector, prior to format decoding.
    Words(Vec<u16>),
}

impl Value {
    /// Coerces to `f64` where the source is numeric (or a numeric string),
    /// used by the rule engine and expression evaluator which only operate
    /// on floats. Non-numeric sources (bools, byte buffers, register
    /// vectors) return `None` and are skipped by the caller, per the
    /// "non-numeric, skip" rule for aggregates and alarms.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(i) => Some(*i as f64),
            Value::UInt16(u) => Some(*u as f64),
            Value::UInt32(u) => Some(*u as f64),
            Value::Float64(f) => Some(*f),
            Value::Str(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) | Value::Bytes(_) | Value::Words(_) => None,
        }
    }

    pub fn is_nil_like(&self) -> bool {
        matches!(self, Value::Words(w) if w.is_empty())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}
