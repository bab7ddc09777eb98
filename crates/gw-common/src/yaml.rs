//! Thin YAML-file loading helper shared by every config struct in the
//! gateway (devices, protocols, points, edge rules, uplinks).

use std::path::Path;

use gw_errors::{GatewayError, Result};
use serde::de::DeserializeOwned;

/// Reads and parses a YAML file into `T`. Any failure here is a config
/// error and, per the propagation policy, fatal at boot.
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        GatewayError::config(format!("reading {}: {e}", path.display()))
    })?;
    serde_yaml::from_str(&raw).map_err(|e| {
        GatewayError::config(format!("parsing {}: {e}", path.display()))
    })
}
