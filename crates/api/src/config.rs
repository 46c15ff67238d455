//! Application configuration loaded from environment variables.

use domain::{LedgerConfig, TransitionPolicy, UnknownTransitionPolicy};
use thiserror::Error;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TRANSITION_POLICY: {0}")]
    TransitionPolicy(#[from] UnknownTransitionPolicy),

    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: Postgres connection string; unset keeps the log in memory
/// - `TRANSITION_POLICY`: `open` or `owner-only` (default: `open`)
/// - `SNAPSHOT_INTERVAL`: events between snapshots, 0 disables (default: `100`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub transition_policy: TransitionPolicy,
    pub snapshot_interval: u64,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let transition_policy = match lookup("TRANSITION_POLICY") {
            Some(value) => value.parse::<TransitionPolicy>()?,
            None => defaults.transition_policy,
        };

        let snapshot_interval = match lookup("SNAPSHOT_INTERVAL") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                name: "SNAPSHOT_INTERVAL",
                value,
            })?,
            None => defaults.snapshot_interval,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            transition_policy,
            snapshot_interval,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the ledger settings.
    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig::default()
            .with_transition_policy(self.transition_policy)
            .with_snapshot_interval(self.snapshot_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            transition_policy: TransitionPolicy::Open,
            snapshot_interval: 100,
        }
    }
}
