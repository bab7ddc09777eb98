//! Unified error types for the edge gateway.
//!
//! Every crate in the workspace returns `gw_errors::Result<T>` at its public
//! boundary. Internal causes (`io::Error`, `serde_yaml::Error`, ...) are
//! wrapped in via `#[from]` rather than re-declared per crate, matching the
//! propagation policy in the spec's error-handling section: config errors
//! are fatal at boot, address/read/format/expression/send errors are
//! recoverable and are handled by their caller.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Severity classification used by callers deciding whether an error is
/// fatal (abort boot) or recoverable (log and continue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Fatal,
    Recoverable,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // ---- Config ----
    #[error("config error: {0}")]
    Config(String),

    // ---- Address / format / expression (point mapper & planner) ----
    #[error("address parse error: {0}")]
    AddressParse(String),

    #[error("short buffer: need {needed} bytes, have {have}")]
    ShortBuffer { needed: usize, have: usize },

    #[error("unknown format tag: {0}")]
    UnknownFormat(String),

    #[error("expression parse error in `{expr}`: {reason}")]
    ExpressionParse { expr: String, reason: String },

    #[error("expression eval error in `{expr}`: {reason}")]
    ExpressionEval { expr: String, reason: String },

    #[error("point not found: {0}")]
    PointNotFound(String),

    #[error("unsupported write type: {0}")]
    UnsupportedWriteType(String),

    // ---- BACnet ----
    #[error("write type mismatch: point `{point}` expects {expected}, got {got}")]
    WriteType {
        point: String,
        expected: String,
        got: String,
    },

    // ---- Protocol adapter lifecycle ----
    #[error("connect error: {0}")]
    Connect(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("init error: {0}")]
    Init(String),

    // ---- Uplink ----
    #[error("send error on channel `{channel}`: {reason}")]
    Send { channel: String, reason: String },

    // ---- I/O and serialization passthrough ----
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    pub fn severity(&self) -> Severity {
        match self {
            GatewayError::Config(_) | GatewayError::Yaml(_) | GatewayError::Io(_) => {
                Severity::Fatal
            }
            _ => Severity::Recoverable,
        }
    }

    pub fn address_parse(msg: impl fmt::Display) -> Self {
        GatewayError::AddressParse(msg.to_string())
    }

    pub fn config(msg: impl fmt::Display) -> Self {
        GatewayError::Config(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_are_fatal() {
        assert_eq!(GatewayError::config("bad").severity(), Severity::Fatal);
    }

    #[test]
    fn read_errors_are_recoverable() {
        assert_eq!(
            GatewayError::Read("timeout".into()).severity(),
            Severity::Recoverable
        );
    }
}
