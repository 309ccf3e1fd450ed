//! Configuration for connecting to InfluxDB and running staleness checks.

mod check;
mod connection;

pub use check::{CheckConfig, NormalizeOptions, DEFAULT_INTERVAL_MINUTES, DEFAULT_OUTPUT_FORMAT};
pub use connection::ConnectionConfig;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value '{value}' for {name}")]
    InvalidValue {
        /// Name of the variable.
        name: &'static str,
        /// The offending value.
        value: String,
    },

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}
