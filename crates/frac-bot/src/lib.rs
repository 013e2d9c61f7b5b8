//! Fractrade executor application.
//!
//! Wires the pieces together:
//! - `AppConfig`: TOML file, `.env` and environment overrides
//! - `Executor`: connection manager + dispatcher + trading client lifecycle
//! - `ShutdownCoordinator`: SIGINT / SIGTERM to cancellation

pub mod config;
pub mod error;
pub mod executor;
pub mod shutdown;

pub use config::{AppConfig, WsConfig};
pub use error::{AppError, AppResult};
pub use executor::Executor;
pub use shutdown::ShutdownCoordinator;
