//! Core domain types for the Fractrade executor.
//!
//! This crate provides the types shared by the connection and dispatch layers:
//! - `Price`, `Size`: Precision-safe numeric types
//! - `OrderSide`: Trading direction
//! - `ActionId`, `TradeOrderConfig`, `StopConfig`: Typed action payloads
//! - `validate`: Pure extraction of typed payloads from raw action configs

pub mod action;
pub mod decimal;
pub mod error;
pub mod order;
pub mod validate;

pub use action::{ActionConfig, ActionId, StopConfig, TradeMetadata, TradeOrderConfig};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result, ValidationError};
pub use order::OrderSide;
pub use validate::{parse_action, parse_stop_order, parse_trade_order};
