//! Ambient stack shared across the edge-gateway workspace: logging,
//! shutdown/signal handling, YAML config loading, and append-only log
//! writers. No protocol or rule-engine logic lives here.

pub mod logging;
pub mod ndjson_log;
pub mod shutdown;
pub mod yaml;

pub use logging::{init as init_logging, LogConfig, LogHandle};
pub use ndjson_log::NdjsonLog;
pub use shutdown::{stop_pair, wait_for_shutdown, StopSwitch, StopToken};
pub use yaml::load_yaml;
