//! Application configuration.
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file,
//! `.env`, process environment.

use crate::error::{AppError, AppResult};
use frac_executor::Credentials;
use frac_ws::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default config file, used when it exists and no path was given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub const ENV_CONFIG_PATH: &str = "FRAC_CONFIG";
pub const ENV_WS_URL: &str = "FRAC_WS_URL";
pub const ENV_USER_TOKEN: &str = "FRAC_USER_TOKEN";
pub const ENV_PRIVATE_KEY: &str = "HYPERLIQUID_PRIVATE_KEY";
pub const ENV_PUBLIC_ADDRESS: &str = "HYPERLIQUID_PUBLIC_ADDRESS";

/// Load `.env` into the process environment.
///
/// Runs before logging is initialized so `LOGLEVEL` and `RUST_LOG` from the
/// file apply; the outcome is returned for the caller to log.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// WebSocket tunables (`[websocket]` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WsConfig {
    /// Fixed delay between reconnection attempts (ms).
    pub reconnect_delay_ms: u64,
    /// Idle time before a keepalive ping (ms).
    pub ping_interval_ms: u64,
    /// Time allowed for traffic after a ping (ms).
    pub ping_timeout_ms: u64,
    /// Handshake timeout (ms).
    pub connect_timeout_ms: u64,
    /// Per-frame handler timeout (ms). 0 = unbounded.
    pub dispatch_timeout_ms: u64,
    /// `Authorization` header scheme.
    pub auth_scheme: String,
}

impl Default for WsConfig {
    fn default() -> Self {
        let defaults = ConnectionConfig::default();
        Self {
            reconnect_delay_ms: defaults.reconnect_delay_ms,
            ping_interval_ms: defaults.ping_interval_ms,
            ping_timeout_ms: defaults.ping_timeout_ms,
            connect_timeout_ms: defaults.connect_timeout_ms,
            dispatch_timeout_ms: defaults.dispatch_timeout_ms,
            auth_scheme: defaults.auth_scheme,
        }
    }
}

impl From<WsConfig> for ConnectionConfig {
    fn from(cfg: WsConfig) -> Self {
        Self {
            url: String::new(),   // Set separately
            token: String::new(), // Set separately
            auth_scheme: cfg.auth_scheme,
            reconnect_delay_ms: cfg.reconnect_delay_ms,
            ping_interval_ms: cfg.ping_interval_ms,
            ping_timeout_ms: cfg.ping_timeout_ms,
            connect_timeout_ms: cfg.connect_timeout_ms,
            dispatch_timeout_ms: cfg.dispatch_timeout_ms,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server base URL, e.g. `wss://example.com`.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// User token for the executor endpoint. Prefer the environment.
    #[serde(default)]
    pub user_token: Option<String>,
    /// Trading account address.
    #[serde(default)]
    pub public_address: Option<String>,
    /// Period of the connection health log line (seconds). 0 disables.
    #[serde(default = "default_health_log_interval_secs")]
    pub health_log_interval_secs: u64,
    #[serde(default)]
    pub websocket: WsConfig,
    /// Resolved from the environment only, never from the file.
    #[serde(skip)]
    pub credentials: Option<Credentials>,
}

fn default_health_log_interval_secs() -> u64 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: None,
            user_token: None,
            public_address: None,
            health_log_interval_secs: default_health_log_interval_secs(),
            websocket: WsConfig::default(),
            credentials: None,
        }
    }
}

impl AppConfig {
    /// Load the complete configuration.
    ///
    /// File: `path`, else `FRAC_CONFIG`, else `config/default.toml` when it
    /// exists, else defaults. Call [`load_dotenv`] first so `.env` values
    /// take part in path resolution and overrides.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let explicit = path
            .map(str::to_string)
            .or_else(|| std::env::var(ENV_CONFIG_PATH).ok());

        let mut config = match explicit {
            Some(path) => {
                info!(config_path = %path, "Loading configuration");
                Self::from_file(&path)?
            }
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                info!(config_path = DEFAULT_CONFIG_PATH, "Loading configuration");
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            None => {
                warn!(path = DEFAULT_CONFIG_PATH, "Config file not found, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific file, without environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Apply environment overrides through `lookup`. Blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_WS_URL) {
            self.ws_url = Some(url);
        }
        if let Some(token) = get(ENV_USER_TOKEN) {
            self.user_token = Some(token);
        }
        if let Some(address) = get(ENV_PUBLIC_ADDRESS) {
            self.public_address = Some(address);
        }

        self.credentials =
            Credentials::from_parts(get(ENV_PRIVATE_KEY), self.public_address.clone());
        if self.credentials.is_none() {
            warn!(
                private_key_var = ENV_PRIVATE_KEY,
                public_address_var = ENV_PUBLIC_ADDRESS,
                "Trading credentials not both set, trading client will be read-only"
            );
        }
    }

    /// Connection settings for the executor endpoint.
    ///
    /// Missing URL or token are left empty and reported by the connection
    /// manager when it starts.
    pub fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::from(self.websocket.clone());
        let base = ConnectionConfig::new(
            self.ws_url.as_deref().unwrap_or_default(),
            self.user_token.clone().unwrap_or_default(),
        );
        config.url = base.url;
        config.token = base.token;
        config
    }
}
