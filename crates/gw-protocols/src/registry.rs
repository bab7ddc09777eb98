//! Protocol registry (design notes §9): maps a protocol tag
//! (`modbus_tcp`, `bacnet`, `s7`, `slmp`, `snmp`, `http`, `tcp`) to an
//! adapter constructor, resolved once at boot.

use std::collections::HashMap;

use gw_errors::{GatewayError, Result};

use crate::adapter::ProtocolAdapter;

type Constructor = Box<dyn Fn() -> Box<dyn ProtocolAdapter> + Send + Sync>;

#[derive(Default)]
pub struct ProtocolRegistry {
    constructors: HashMap<String, Constructor>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, tag: impl Into<String>, ctor: F)
    where
        F: Fn() -> Box<dyn ProtocolAdapter> + Send + Sync + 'static,
    {
        self.constructors.insert(tag.into(), Box::new(ctor));
    }

    pub fn construct(&self, tag: &str) -> Result<Box<dyn ProtocolAdapter>> {
        self.constructors
            .get(tag)
            .map(|ctor| ctor())
            .ok_or_else(|| GatewayError::config(format!("unregistered protocol tag `{tag}`")))
    }

    /// The default registry wired at boot: every built-in adapter,
    /// keyed by the protocol tags listed in spec §3.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("modbus_tcp", || Box::new(crate::modbus::ModbusTcpAdapter::new()));
        registry.register("bacnet", || Box::new(crate::bacnet::BacnetAdapter::new()));
        registry.register("s7", || Box::new(crate::other::S7Adapter::new()));
        registry.register("slmp", || Box::new(crate::other::SlmpAdapter::new()));
        registry.register("snmp", || Box::new(crate::other::SnmpAdapter::new()));
        registry.register("tcp", || Box::new(crate::other::TcpAdapter::new()));
        registry.register("http", || Box::new(crate::other::HttpAdapter::new()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingAdapter;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn unregistered_tag_is_a_config_error() {
        let registry = ProtocolRegistry::new();
        assert!(registry.construct("modbus_tcp").is_err());
    }

    #[test]
    fn registered_tag_constructs() {
        let mut registry = ProtocolRegistry::new();
        registry.register("counting", || Box::new(CountingAdapter::new(Arc::new(AtomicUsize::new(0)))));
        assert!(registry.construct("counting").is_ok());
    }
}
