//! Client pool (spec §4.5): at most one live client per
//! `(protocol, ip, port)` triple, process-lifetime retention, no
//! eviction.
//!
//! Grounded on the teacher's `dashmap`-backed connection maps: a
//! concurrent map gives us "insert-once semantics under a write path,
//! many concurrent readers" (spec §5) without hand-rolling a
//! `RwLock<HashMap<_, _>>` and its lock-upgrade dance.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use gw_errors::Result;

use crate::adapter::{AdapterConfig, ProtocolAdapter};
use crate::registry::ProtocolRegistry;

/// `(protocol, ip, port)` — the pool's dedup key (spec §3, §4.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub protocol: String,
    pub ip: String,
    pub port: u16,
}

impl ClientKey {
    pub fn new(protocol: impl Into<String>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            ip: ip.into(),
            port,
        }
    }
}

/// Keyed store of live protocol clients. `get_or_create` is the only way
/// to obtain a client; there is no `remove`/eviction path (spec §4.5:
/// "No eviction; process-lifetime retention").
pub struct ClientPool {
    clients: DashMap<ClientKey, Arc<dyn ProtocolAdapter>>,
    registry: ProtocolRegistry,
}

impl ClientPool {
    pub fn new(registry: ProtocolRegistry) -> Self {
        Self {
            clients: DashMap::new(),
            registry,
        }
    }

    /// Returns the existing client for `key`, or constructs, initializes,
    /// and inserts a new one. Concurrent callers racing on the same key
    /// never end up with two live clients: `DashMap::entry` takes a
    /// per-shard lock for the duration of the closure.
    pub async fn get_or_create(&self, key: &ClientKey, config: &AdapterConfig) -> Result<Arc<dyn ProtocolAdapter>> {
        if let Some(existing) = self.clients.get(key) {
            return Ok(existing.clone());
        }

        let adapter = self.registry.construct(&key.protocol)?;
        adapter.init(config).await?;
        let adapter: Arc<dyn ProtocolAdapter> = Arc::from(adapter);

        match self.clients.entry(key.clone()) {
            Entry::Occupied(occupied) => Ok(occupied.get().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(adapter.clone());
                Ok(adapter)
            }
        }
    }

    /// Requests a reconnect on the client for `key`, if one exists. Per
    /// spec §3 lifecycles: reconnect resets the underlying transport but
    /// preserves the pool key (the client is not removed/re-inserted).
    pub async fn reconnect(&self, key: &ClientKey) -> Result<()> {
        if let Some(client) = self.clients.get(key) {
            client.reconnect().await?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProtocolRegistry;
    use crate::testing::CountingAdapter;

    #[tokio::test]
    async fn at_most_one_client_per_key() {
        let mut registry = ProtocolRegistry::new();
        let counter = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        registry.register("counting", {
            let counter = counter.clone();
            move || Box::new(CountingAdapter::new(counter.clone()))
        });
        let pool = ClientPool::new(registry);
        let key = ClientKey::new("counting", "10.0.0.5", 502);
        let config = AdapterConfig::new();

        for _ in 0..5 {
            pool.get_or_create(&key, &config).await.unwrap();
        }

        assert_eq!(pool.len(), 1);
        assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_clients() {
        let mut registry = ProtocolRegistry::new();
        registry.register("counting", || Box::new(CountingAdapter::new(Arc::new(std::sync::atomic::AtomicUsize::new(0)))));
        let pool = ClientPool::new(registry);
        let config = AdapterConfig::new();

        pool.get_or_create(&ClientKey::new("counting", "10.0.0.5", 502), &config)
            .await
            .unwrap();
        pool.get_or_create(&ClientKey::new("counting", "10.0.0.6", 502), &config)
            .await
            .unwrap();

        assert_eq!(pool.len(), 2);
    }
}
