//! Boot wiring and lifecycle (spec §5): loads config, constructs the
//! protocol registry/client pool/rule engine/uplink manager, spawns one
//! scheduler task per (device, function group), installs the SIGHUP
//! reload handler, and waits for shutdown.
//!
//! Grounded on `services/comsrv/src/main.rs`'s `start_communication_service`
//! / `shutdown_handler` split and on the original's
//! `StartSchedulerWithRuleEngineAndUplink` boot sequence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use gw_common::{stop_pair, wait_for_shutdown, NdjsonLog};
use gw_errors::Result;
use gw_protocols::{ClientPool, ProtocolRegistry};
use gw_rules::RuleEngine;
use gw_uplink::UplinkManager;

use crate::config::GatewayConfig;
use crate::scheduler::{client_key, SchedulerTask};

pub struct Supervisor {
    config: GatewayConfig,
    log_dir: Option<std::path::PathBuf>,
}

impl Supervisor {
    pub fn new(config: GatewayConfig, log_dir: Option<std::path::PathBuf>) -> Self {
        Self { config, log_dir }
    }

    /// Boots every component, spawns the scheduler tasks, and blocks
    /// until Ctrl+C/SIGTERM (spec §5). Returns once every scheduler task
    /// has observed the stop signal.
    pub async fn run(self) -> Result<()> {
        let registry = ProtocolRegistry::with_builtins();
        let pool = Arc::new(ClientPool::new(registry));

        let rule_log = self.open_ndjson_log("edge_rule.log");
        let mut engine = RuleEngine::new(self.config.rules.clone());
        if let Some(log) = rule_log {
            engine = engine.with_persist_log(log);
        }
        let rule_engine = Arc::new(engine);

        let uplink_log = self.open_ndjson_log("uplink.log");
        let mut uplinks = UplinkManager::from_config(self.config.uplinks.clone()).await;
        if let Some(log) = uplink_log {
            uplinks = uplinks.with_log(log);
        }
        let uplinks = Arc::new(uplinks);
        tracing::info!("{} uplink channel(s) active", uplinks.channel_count());

        let devices_by_id: Arc<HashMap<String, gw_model::DeviceDescriptor>> = Arc::new(
            self.config
                .devices
                .iter()
                .map(|d| (d.id.clone(), d.clone()))
                .collect(),
        );

        let (stop_switch, stop_token) = stop_pair();

        self.install_reload_handler(rule_engine.clone());

        let mut handles = Vec::new();
        for device in &self.config.devices {
            let Some(points) = self.config.points_for(&device.id) else {
                tracing::warn!("device `{}` has no entry in points.yaml, skipping", device.id);
                continue;
            };
            let key = client_key(device);
            match pool.get_or_create(&key, &device.config).await {
                Ok(client) => {
                    for function in &points.functions {
                        if let Err(e) = client.register_points(&device.id, &function.points).await {
                            tracing::warn!(
                                "device {} function {}: point registration failed: {e}",
                                device.id,
                                function.function
                            );
                        }
                    }
                }
                Err(e) => tracing::warn!("device {}: client unavailable at boot: {e}", device.id),
            }

            for function in &points.functions {
                let task = SchedulerTask {
                    device: device.clone(),
                    function: function.clone(),
                    pool: pool.clone(),
                    rule_engine: rule_engine.clone(),
                    uplinks: uplinks.clone(),
                    devices_by_id: devices_by_id.clone(),
                    stop: stop_token.clone(),
                };
                tracing::info!("starting scheduler task for {}/{}", device.id, function.function);
                handles.push(tokio::spawn(task.run()));
            }
        }

        wait_for_shutdown().await;
        tracing::info!("shutdown signal received, stopping {} scheduler task(s)", handles.len());
        stop_switch.stop_all();

        for handle in handles {
            let _ = handle.await;
        }
        tracing::info!("all scheduler tasks stopped");
        Ok(())
    }

    fn open_ndjson_log(&self, file_name: &str) -> Option<NdjsonLog> {
        let dir = self.log_dir.as_ref()?;
        match NdjsonLog::open(dir.join(file_name)) {
            Ok(log) => Some(log),
            Err(e) => {
                tracing::warn!("failed to open {file_name}: {e}");
                None
            }
        }
    }

    /// spec §4.7 Reload: SIGHUP re-reads `edge_rules.yaml` and swaps the
    /// engine's three rule vectors without restarting any scheduler task.
    fn install_reload_handler(&self, engine: Arc<RuleEngine>) {
        let path = self.config.edge_rules_path.clone();
        gw_common::logging::on_sighup(move || {
            let engine = engine.clone();
            let path = path.clone();
            match gw_rules::load_ruleset(&path) {
                Ok(rules) => {
                    engine.reload(rules);
                    tracing::info!("edge rules reloaded from {}", path.display());
                }
                Err(e) => tracing::warn!("edge rules reload failed, keeping previous rules: {e}"),
            }
        });
    }
}

/// Convenience entry point used by `main`: loads config from `config_dir`
/// and runs the supervisor to completion.
pub async fn boot(config_dir: impl AsRef<Path>, gateway_id: &str, log_dir: Option<std::path::PathBuf>) -> Result<()> {
    let config = GatewayConfig::load(config_dir, gateway_id)?;
    Supervisor::new(config, log_dir).run().await
}
