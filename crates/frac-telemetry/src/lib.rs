//! Structured logging for the Fractrade executor.
//!
//! - Pretty output for development, JSON for production (`RUST_ENV=production`)
//! - `RUST_LOG` overrides any level chosen on the command line

pub mod error;
pub mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, resolve_filter, DEFAULT_FILTER};
