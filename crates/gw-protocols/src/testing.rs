//! Test-only adapter double, shared by the client pool and registry
//! unit tests. Not compiled into non-test builds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use gw_errors::Result;
use gw_model::Value;

use crate::adapter::{AddressSpec, AdapterConfig, PointValue, ProtocolAdapter};

/// Counts how many times `init` runs, so pooling tests can assert a
/// client was constructed exactly once per key.
pub struct CountingAdapter {
    init_count: Arc<AtomicUsize>,
}

impl CountingAdapter {
    pub fn new(init_count: Arc<AtomicUsize>) -> Self {
        Self { init_count }
    }
}

#[async_trait]
impl ProtocolAdapter for CountingAdapter {
    async fn init(&self, _config: &AdapterConfig) -> Result<()> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read(&self, _device_id: &str, addresses: &[AddressSpec]) -> Result<Vec<PointValue>> {
        Ok(addresses.iter().map(|a| PointValue::good(a.point_id.clone(), Value::Bool(true))).collect())
    }

    async fn write(&self, _point_or_address: &str, _value: Value) -> Result<()> {
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    async fn reconnect(&self) -> Result<()> {
        Ok(())
    }
}
