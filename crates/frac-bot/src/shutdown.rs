//! Process signal handling.
//!
//! SIGINT and (on unix) SIGTERM cancel one shared token. Everything else
//! observes the token; nothing is torn down from the signal task itself.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Converts process signals into cancellation of a shared token.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Spawn the signal listener for `token`.
    ///
    /// The task ends after the first signal, or when the token is cancelled
    /// by other means.
    pub fn install(token: CancellationToken) -> (Self, JoinHandle<()>) {
        let coordinator = Self::new(token);
        let listener = coordinator.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                signal = wait_for_signal() => {
                    info!(signal, "Shutdown signal received");
                    listener.trigger();
                }
                _ = listener.token.cancelled() => {}
            }
        });
        (coordinator, handle)
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            info!("Shutdown requested");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown was requested.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            return ctrl_c().await;
        }
    };

    tokio::select! {
        name = ctrl_c() => name,
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler only SIGTERM or the token can end the process.
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
