//! Application configuration structs
//!
//! Loads configuration from environment variables and an optional `.env` file.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub heartbeat: HeartbeatConfig,
    pub hub: HubConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "production" => Some(Self::Production),
            "staging" => Some(Self::Staging),
            "development" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Server bind configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection liveness settings
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatConfig {
    /// Interval advertised to clients in the Hello frame
    #[serde(default = "default_heartbeat_interval_ms")]
    pub interval_ms: u64,
    /// Silence after which a connection is considered dead
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub timeout_ms: u64,
}

impl HeartbeatConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_heartbeat_interval_ms(),
            timeout_ms: default_heartbeat_timeout_ms(),
        }
    }
}

/// Chat hub settings
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Outbound queue capacity per connection
    #[serde(default = "default_message_buffer")]
    pub message_buffer: usize,
    /// Request header carrying the upstream-authenticated user id
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            message_buffer: default_message_buffer(),
            identity_header: default_identity_header(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "lms-chat".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_heartbeat_interval_ms() -> u64 {
    45_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    90_000
}

fn default_message_buffer() -> usize {
    100
}

fn default_identity_header() -> String {
    "x-user-id".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .and_then(|s| Environment::parse(&s))
                    .unwrap_or_default(),
            },
            gateway: ServerConfig {
                host: lookup("GATEWAY_HOST").unwrap_or_else(default_host),
                port: parse_required(&lookup, "GATEWAY_PORT")?,
            },
            heartbeat: HeartbeatConfig {
                interval_ms: parse_or(&lookup, "HEARTBEAT_INTERVAL_MS", default_heartbeat_interval_ms)?,
                timeout_ms: parse_or(&lookup, "HEARTBEAT_TIMEOUT_MS", default_heartbeat_timeout_ms)?,
            },
            hub: HubConfig {
                message_buffer: parse_or(&lookup, "HUB_MESSAGE_BUFFER", default_message_buffer)?,
                identity_header: lookup("HUB_IDENTITY_HEADER")
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(default_identity_header),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat.interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "HEARTBEAT_INTERVAL_MS",
                "must be greater than zero".to_string(),
            ));
        }

        if self.heartbeat.timeout_ms <= self.heartbeat.interval_ms {
            return Err(ConfigError::InvalidValue(
                "HEARTBEAT_TIMEOUT_MS",
                format!(
                    "must exceed the heartbeat interval ({} ms)",
                    self.heartbeat.interval_ms
                ),
            ));
        }

        if self.hub.message_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "HUB_MESSAGE_BUFFER",
                "must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_required<F, T>(lookup: &F, key: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key).ok_or(ConfigError::MissingVar(key))?;
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key, raw))
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        None => Ok(default()),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
