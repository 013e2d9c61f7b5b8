//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when nothing else is configured.
pub const DEFAULT_FILTER: &str = "info";

/// Pick the filter directive.
///
/// Precedence: `RUST_LOG` > CLI level > `LOGLEVEL` env > [`DEFAULT_FILTER`].
/// Plain level names are accepted in any case ("DEBUG", "warning").
pub fn resolve_filter(
    rust_log: Option<&str>,
    cli_level: Option<&str>,
    env_level: Option<&str>,
) -> String {
    if let Some(directive) = rust_log.filter(|s| !s.trim().is_empty()) {
        return directive.to_string();
    }

    let non_blank = |s: &&str| !s.trim().is_empty();
    cli_level
        .filter(non_blank)
        .or(env_level.filter(non_blank))
        .map(normalize_level)
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

fn normalize_level(level: &str) -> String {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        other => other.to_string(),
    }
}

/// Initialize structured logging.
///
/// Configures tracing with JSON output for production and
/// pretty output for development.
pub fn init_logging(cli_level: Option<&str>) -> TelemetryResult<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_level = std::env::var("LOGLEVEL").ok();
    let directive = resolve_filter(rust_log.as_deref(), cli_level, env_level.as_deref());

    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| TelemetryError::InvalidFilter(format!("{directive}: {e}")))?;

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_names(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}
