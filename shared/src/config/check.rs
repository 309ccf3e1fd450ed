//! Options for date normalization and staleness checks.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::ConfigError;

/// Default output layout for normalized timestamps.
pub const DEFAULT_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default lookback window in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

/// Options applied when normalizing a timestamp string.
///
/// # Examples
///
/// ```
/// use shared::config::NormalizeOptions;
///
/// let options = NormalizeOptions::default().with_timezone_offset(2);
/// assert_eq!(options.timezone_offset_hours, 2);
/// assert_eq!(options.output_format, "%Y-%m-%d %H:%M:%S");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Signed whole-hour offset added to the parsed timestamp (default: 0).
    #[serde(default)]
    pub timezone_offset_hours: i32,
    /// `chrono` strftime layout used to render the result
    /// (default: `%Y-%m-%d %H:%M:%S`).
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

impl NormalizeOptions {
    /// Sets the timezone offset in hours.
    #[must_use]
    pub fn with_timezone_offset(mut self, hours: i32) -> Self {
        self.timezone_offset_hours = hours;
        self
    }

    /// Sets the output layout.
    #[must_use]
    pub fn with_output_format(mut self, layout: impl Into<String>) -> Self {
        self.output_format = layout.into();
        self
    }
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            timezone_offset_hours: 0,
            output_format: default_output_format(),
        }
    }
}

/// Parameters of a staleness run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CheckConfig {
    /// Lookback window in minutes (default: 60).
    #[validate(range(min = 1, message = "Interval must be at least one minute"))]
    pub interval_minutes: u32,
    /// Database names left out of enumeration.
    #[serde(default)]
    pub exclude_databases: Vec<String>,
}

impl CheckConfig {
    /// Creates a configuration with the given lookback window and no exclusions.
    #[must_use]
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            interval_minutes,
            exclude_databases: Vec::new(),
        }
    }

    /// Adds a database name to the exclusion list.
    #[must_use]
    pub fn exclude(mut self, database: impl Into<String>) -> Self {
        self.exclude_databases.push(database.into());
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()?;
        Ok(())
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL_MINUTES)
    }
}
