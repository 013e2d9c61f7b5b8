//! Action routing.
//!
//! Maps each decoded message to one handler call. Dispatch never fails:
//! unknown types and actions are logged and dropped.

use crate::client::TradingClient;
use crate::handler::{ActionHandler, DefaultActionHandler};
use frac_core::ActionId;
use frac_ws::{BoxFuture, InboundMessage, MessageHandler};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What happened to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `type` was not `ACTION`.
    Ignored { message_type: String },
    /// `action_id` matched no handler.
    Unsupported { action_id: String },
    /// A handler ran; `submitted` is its result.
    Handled { action: ActionId, submitted: bool },
}

/// Dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub ignored: u64,
    pub unsupported: u64,
    pub handled: u64,
    pub submitted: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ignored: AtomicU64,
    unsupported: AtomicU64,
    handled: AtomicU64,
    submitted: AtomicU64,
}

/// Routes `ACTION` messages to the configured [`ActionHandler`].
pub struct ActionDispatcher {
    client: RwLock<Option<Arc<dyn TradingClient>>>,
    handler: Arc<dyn ActionHandler>,
    counters: Counters,
}

impl ActionDispatcher {
    /// Dispatcher using [`DefaultActionHandler`].
    pub fn new(client: Arc<dyn TradingClient>) -> Self {
        Self::with_handler(client, Arc::new(DefaultActionHandler))
    }

    pub fn with_handler(client: Arc<dyn TradingClient>, handler: Arc<dyn ActionHandler>) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            handler,
            counters: Counters::default(),
        }
    }

    /// Current client, None after [`take_client`](Self::take_client).
    pub fn client(&self) -> Option<Arc<dyn TradingClient>> {
        self.client.read().clone()
    }

    /// Detach the client for teardown. Later dispatches report `false`.
    pub fn take_client(&self) -> Option<Arc<dyn TradingClient>> {
        self.client.write().take()
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            unsupported: self.counters.unsupported.load(Ordering::Relaxed),
            handled: self.counters.handled.load(Ordering::Relaxed),
            submitted: self.counters.submitted.load(Ordering::Relaxed),
        }
    }

    /// Route one message.
    pub async fn dispatch(&self, message: &InboundMessage) -> DispatchOutcome {
        if !message.is_action() {
            warn!(message_type = %message.message_type(), "Unsupported message type");
            self.counters.ignored.fetch_add(1, Ordering::Relaxed);
            return DispatchOutcome::Ignored {
                message_type: message.message_type().to_string(),
            };
        }

        let action = match message.action_id().parse::<ActionId>() {
            Ok(action) => action,
            Err(_) => {
                warn!(action_id = %message.action_id(), "Unsupported action");
                self.counters.unsupported.fetch_add(1, Ordering::Relaxed);
                return DispatchOutcome::Unsupported {
                    action_id: message.action_id().to_string(),
                };
            }
        };

        self.counters.handled.fetch_add(1, Ordering::Relaxed);
        debug!(action = %action, "Dispatching action");

        // Clone out so the lock is not held across the handler call.
        let Some(client) = self.client() else {
            error!(action = %action, "Trading client released, action dropped");
            return DispatchOutcome::Handled {
                action,
                submitted: false,
            };
        };

        let config = message.config();
        let submitted = match action {
            ActionId::ExecutePerpTrade => self.handler.handle_trade(client.as_ref(), config).await,
            ActionId::SetStopLoss => self.handler.handle_stop_loss(client.as_ref(), config).await,
            ActionId::SetTakeProfit => {
                self.handler
                    .handle_take_profit(client.as_ref(), config)
                    .await
            }
        };

        if submitted {
            self.counters.submitted.fetch_add(1, Ordering::Relaxed);
        }
        DispatchOutcome::Handled { action, submitted }
    }
}

impl MessageHandler for ActionDispatcher {
    fn handle(&self, message: InboundMessage) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.dispatch(&message).await;
        })
    }
}
