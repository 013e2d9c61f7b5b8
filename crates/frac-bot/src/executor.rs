//! Executor lifecycle.
//!
//! Owns the shutdown token, the connection manager and the dispatcher (which
//! in turn owns the trading client). Teardown order is fixed: cancel token,
//! join the connection task, close the trading client.

use crate::config::AppConfig;
use crate::error::AppResult;
use frac_executor::{ActionDispatcher, ActionHandler, PaperTradingClient, TradingClient};
use frac_ws::{ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStats};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// One executor session bound to the executor endpoint.
pub struct Executor {
    shutdown_token: CancellationToken,
    connection: Arc<ConnectionManager>,
    dispatcher: Arc<ActionDispatcher>,
    health_log_interval: Option<Duration>,
}

impl Executor {
    pub fn new(config: ConnectionConfig, client: Arc<dyn TradingClient>) -> Self {
        Self::with_dispatcher(config, Arc::new(ActionDispatcher::new(client)))
    }

    /// Executor with custom action handlers.
    pub fn with_handler(
        config: ConnectionConfig,
        client: Arc<dyn TradingClient>,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        Self::with_dispatcher(config, Arc::new(ActionDispatcher::with_handler(client, handler)))
    }

    fn with_dispatcher(config: ConnectionConfig, dispatcher: Arc<ActionDispatcher>) -> Self {
        let shutdown_token = CancellationToken::new();
        let connection = Arc::new(ConnectionManager::new(
            config,
            dispatcher.clone(),
            shutdown_token.clone(),
        ));
        Self {
            shutdown_token,
            connection,
            dispatcher,
            health_log_interval: None,
        }
    }

    /// Executor backed by the paper trading client.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = Arc::new(PaperTradingClient::new(config.credentials.clone()));
        Self::new(config.connection_config(), client)
            .with_health_log_interval(Duration::from_secs(config.health_log_interval_secs))
    }

    /// Log connection health every `interval` while running. Zero disables.
    pub fn with_health_log_interval(mut self, interval: Duration) -> Self {
        self.health_log_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Cancelling this token stops the executor.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn stats(&self) -> ConnectionStats {
        self.connection.stats()
    }

    pub fn dispatcher(&self) -> &Arc<ActionDispatcher> {
        &self.dispatcher
    }

    /// Start the connection in the background.
    ///
    /// Fails on missing URL or token, before any connection attempt.
    pub fn start(&self) -> AppResult<()> {
        self.connection.start()?;
        Ok(())
    }

    /// Tear down the connection, then release the trading client.
    ///
    /// Idempotent. Failures are logged, never propagated.
    pub async fn stop(&self) {
        self.connection.stop().await;

        if let Some(client) = self.dispatcher.take_client() {
            match client.close().await {
                Ok(()) => info!("Trading client closed"),
                Err(e) => error!(error = %e, "Failed to close trading client"),
            }
        }
    }

    /// Start, run until the shutdown token is cancelled, then stop.
    pub async fn run(&self) -> AppResult<()> {
        if let Err(e) = self.start() {
            self.stop().await;
            return Err(e);
        }
        info!("Executor running");

        match self.health_log_interval {
            Some(interval) => {
                let mut ticker = tokio::time::interval(interval);
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = self.shutdown_token.cancelled() => break,
                        _ = ticker.tick() => self.log_health(),
                    }
                }
            }
            None => self.shutdown_token.cancelled().await,
        }

        info!("Shutting down executor");
        self.stop().await;
        info!("Executor stopped");
        Ok(())
    }

    fn log_health(&self) {
        let conn = self.connection.stats();
        let dispatch = self.dispatcher.stats();
        info!(
            state = %conn.state,
            reconnect_attempts = conn.reconnect_attempts,
            frames_received = conn.frames_received,
            decode_errors = conn.decode_errors,
            last_connected_at = ?conn.last_connected_at,
            actions_handled = dispatch.handled,
            orders_submitted = dispatch.submitted,
            "Executor health"
        );
    }
}
