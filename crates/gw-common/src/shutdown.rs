//! Graceful shutdown signal handling, shared by every long-running task.

/// Resolves once the process receives Ctrl+C (SIGINT) or, on Unix, SIGTERM.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let term = signal(SignalKind::terminate());
        match term {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}; only Ctrl+C will work");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// A cooperative stop token handed to every scheduler task so the
/// supervisor can cancel an in-flight `wait-for-tick` cleanly.
#[derive(Clone)]
pub struct StopToken(tokio::sync::watch::Receiver<bool>);

pub struct StopSwitch(tokio::sync::watch::Sender<bool>);

pub fn stop_pair() -> (StopSwitch, StopToken) {
    let (tx, rx) = tokio::sync::watch::channel(false);
    (StopSwitch(tx), StopToken(rx))
}

impl StopSwitch {
    pub fn stop_all(&self) {
        let _ = self.0.send(true);
    }
}

impl StopToken {
    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves when the switch is flipped; used in a `tokio::select!`
    /// alongside the tick interval and the per-read timeout.
    pub async fn cancelled(&mut self) {
        while !*self.0.borrow() {
            if self.0.changed().await.is_err() {
                return;
            }
        }
    }
}
