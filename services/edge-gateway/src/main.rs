//! # Edge Gateway - Main Entry Point
//!
//! The main executable for the industrial edge gateway: protocol
//! adapters (Modbus/TCP, BACnet/IP, S7, SLMP, SNMP, raw TCP, HTTP), a
//! per-device acquisition scheduler, the edge rule engine, and
//! multi-channel uplink fan-out.
//!
//! ## Usage
//!
//! ```bash
//! # Start with the default config directory
//! cargo run --bin edge-gateway
//!
//! # Start with a custom config directory and gateway id
//! cargo run --bin edge-gateway -- --config-dir /etc/edge-gateway --gateway-id plant-3
//! ```

use std::path::PathBuf;

use clap::Parser;
use gw_errors::Result;

mod config;
mod scheduler;
mod supervisor;

/// Command line arguments for the edge gateway.
#[derive(Parser)]
#[command(
    name = "edge-gateway",
    version = env!("CARGO_PKG_VERSION"),
    about = "Industrial edge gateway: protocol acquisition, edge rules, uplink fan-out"
)]
struct Args {
    /// Directory containing devices.yaml, protocols.yaml, points.yaml,
    /// edge_rules.yaml, uplinks.yaml.
    #[arg(short, long, default_value = "config")]
    config_dir: String,

    /// This gateway's identity, injected into every device's merged
    /// config as `gateway_id` (spec §3 device-meta).
    #[arg(short, long, default_value = "edge-gateway")]
    gateway_id: String,

    /// Directory for rotated log files and the `edge_rule.log`/
    /// `uplink.log` persistence sinks. Omit to log to console only.
    #[arg(long)]
    log_dir: Option<String>,

    /// Override log level (debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_dir = args.log_dir.map(PathBuf::from);

    let _log_handle = gw_common::init_logging(gw_common::LogConfig {
        default_level: args.log_level.unwrap_or_default(),
        log_dir: log_dir.clone(),
        service_name: "edge-gateway".to_string(),
    });

    tracing::info!("starting edge gateway v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("config directory: {}", args.config_dir);

    if let Err(e) = supervisor::boot(&args.config_dir, &args.gateway_id, log_dir).await {
        tracing::error!("edge gateway exited with error: {e}");
        return Err(e);
    }

    tracing::info!("edge gateway shutdown complete");
    Ok(())
}
