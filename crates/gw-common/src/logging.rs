//! Logging setup shared by the supervisor binary and its tests.
//!
//! Console output always goes through `tracing-subscriber`'s `fmt` layer with
//! an `EnvFilter` driven by `RUST_LOG` (defaulting to `info`). When a log
//! directory is configured, a second non-blocking file layer writes
//! newline-delimited JSON, rotated daily by `tracing-appender`.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub default_level: String,
    pub log_dir: Option<PathBuf>,
    pub service_name: String,
}

/// Guard must be held for the lifetime of the process; dropping it stops the
/// non-blocking file writer from flushing further records.
pub struct LogHandle {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(config: LogConfig) -> LogHandle {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if config.default_level.is_empty() {
            "info".to_string()
        } else {
            config.default_level.clone()
        }));

    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", config.service_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    LogHandle { _file_guard: guard }
}

/// Installs a SIGHUP handler that invokes `on_hup` whenever the process
/// receives a hangup signal. Used by the supervisor to trigger rule reload;
/// a no-op on non-Unix targets.
pub fn on_sighup<F>(on_hup: F)
where
    F: Fn() + Send + 'static,
{
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        tokio::spawn(async move {
            match signal(SignalKind::hangup()) {
                Ok(mut hup) => loop {
                    hup.recv().await;
                    on_hup();
                },
                Err(e) => tracing::warn!("failed to install SIGHUP handler: {e}"),
            }
        });
    }
    #[cfg(not(unix))]
    {
        let _ = on_hup;
    }
}
