//! Action dispatch for the Fractrade executor.
//!
//! - `TradingClient`: capability interface of the trade-execution client
//! - `ActionHandler`: overridable per-action handlers with default policy
//! - `ActionDispatcher`: routes inbound messages to handlers, in order
//! - `MockTradingClient` / `PaperTradingClient`: in-process client implementations

pub mod client;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod mock;
pub mod paper;

pub use client::TradingClient;
pub use credentials::Credentials;
pub use dispatcher::{ActionDispatcher, DispatchOutcome, DispatchStats};
pub use error::{ClientError, ClientResult};
pub use handler::{
    place_order, place_stop_loss, place_take_profit, ActionHandler, DefaultActionHandler,
};
pub use mock::{ClientCall, MockTradingClient};
pub use paper::{PaperOrder, PaperTradingClient};
