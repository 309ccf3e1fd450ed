//! Connection settings for the InfluxDB HTTP API.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use super::ConfigError;

/// Connection configuration for an InfluxDB 1.x server.
///
/// Configuration values can be set via environment variables:
/// - `FLUXWATCH_HOST`: Server host (default: "localhost")
/// - `FLUXWATCH_PORT`: Server port (default: 8086)
/// - `FLUXWATCH_USER`: Username (default: empty, no authentication)
/// - `FLUXWATCH_PASSWORD`: Password (default: empty)
/// - `FLUXWATCH_SSL`: Use HTTPS (default: false)
/// - `FLUXWATCH_VERIFY_SSL`: Verify server certificates (default: false)
/// - `FLUXWATCH_TIMEOUT_SECS`: Per-request timeout (default: 10)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ConnectionConfig {
    /// Server host name or address.
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,
    /// Server port.
    #[validate(range(min = 1, message = "Port must be greater than zero"))]
    pub port: u16,
    /// Username; authentication is skipped when empty.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Connect over HTTPS.
    #[serde(default)]
    pub ssl: bool,
    /// Verify the server certificate when `ssl` is set.
    #[serde(default)]
    pub verify_ssl: bool,
    /// Per-request timeout in seconds.
    #[validate(range(min = 1, message = "Timeout must be at least one second"))]
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    /// Creates a configuration for `host:port` with defaults for everything else.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the TLS flags.
    #[must_use]
    pub fn with_ssl(mut self, ssl: bool, verify_ssl: bool) -> Self {
        self.ssl = ssl;
        self.verify_ssl = verify_ssl;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed, or if the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            host: std::env::var("FLUXWATCH_HOST").unwrap_or(defaults.host),
            port: parse_var("FLUXWATCH_PORT", str::parse::<u16>)?.unwrap_or(defaults.port),
            username: std::env::var("FLUXWATCH_USER").unwrap_or(defaults.username),
            password: std::env::var("FLUXWATCH_PASSWORD").unwrap_or(defaults.password),
            ssl: parse_var("FLUXWATCH_SSL", parse_bool)?.unwrap_or(defaults.ssl),
            verify_ssl: parse_var("FLUXWATCH_VERIFY_SSL", parse_bool)?
                .unwrap_or(defaults.verify_ssl),
            timeout_secs: parse_var("FLUXWATCH_TIMEOUT_SECS", str::parse::<u64>)?
                .unwrap_or(defaults.timeout_secs),
        };

        config.validate_config()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is empty or the port or timeout is zero.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }

    /// Returns the base URL of the server, e.g. `https://influx:8086`.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.host, self.port)
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns true when requests should carry credentials.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            username: String::new(),
            password: String::new(),
            ssl: false,
            verify_ssl: false,
            timeout_secs: 10,
        }
    }
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("ssl", &self.ssl)
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn parse_var<T, E>(
    name: &'static str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse(raw.trim())
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(raw: &str) -> Result<bool, ()> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "y" | "t" | "yes" | "true" | "on" => Ok(true),
        "0" | "n" | "f" | "no" | "false" | "off" => Ok(false),
        _ => Err(()),
    }
}
