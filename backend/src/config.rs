//! Configuration management for the supply restock service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with RESTOCK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::DEFAULT_HISTORY_WINDOW_DAYS;

const DEFAULT_NOTIFY_TIMEOUT_MS: u64 = 5_000;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Which storage backend holds the ledger
    pub storage: StorageConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// LINE Messaging API configuration for low-stock notifications
    #[serde(default)]
    pub line: LineConfig,

    /// Restock engine policy
    pub restock: RestockConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key used to verify JWT tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LineConfig {
    /// LINE Messaging API access token; notifications are only logged when unset
    pub channel_access_token: Option<String>,

    /// HTTP timeout for a single push request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct RestockConfig {
    /// Consumption history retention window
    pub history_window_days: i64,

    /// Record a zero-amount consumption event when an item needs nothing
    pub record_zero_consumption: bool,

    /// Upper bound on one notifier call before the engine gives up on it
    pub notify_timeout_ms: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("RESTOCK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("storage.backend", "postgres")?
            .set_default("restock.history_window_days", DEFAULT_HISTORY_WINDOW_DAYS)?
            .set_default("restock.record_zero_consumption", false)?
            .set_default("restock.notify_timeout_ms", DEFAULT_NOTIFY_TIMEOUT_MS)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RESTOCK_ prefix)
            .add_source(
                Environment::with_prefix("RESTOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for RestockConfig {
    fn default() -> Self {
        Self {
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
            record_zero_consumption: false,
            notify_timeout_ms: DEFAULT_NOTIFY_TIMEOUT_MS,
        }
    }
}

impl RestockConfig {
    pub fn notify_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.notify_timeout_ms)
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token: None,
            request_timeout_secs: 10,
        }
    }
}
