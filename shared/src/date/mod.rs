//! Timestamp normalization.
//!
//! InfluxDB hands back RFC 3339 timestamps (`2024-05-01T10:15:30.123Z`) while
//! local clocks are usually rendered as `2024-05-01 10:15:30.123456`. This
//! module locates one of the accepted representations inside a string, parses
//! it to whole-second precision, shifts it by a whole-hour offset and renders it
//! with a caller-chosen layout.
//!
//! # Example
//!
//! ```
//! use shared::config::NormalizeOptions;
//! use shared::date::normalize;
//!
//! let options = NormalizeOptions::default().with_timezone_offset(2);
//! let normalized = normalize("2024-05-01T10:15:30.123Z", &options).unwrap();
//! assert_eq!(normalized, "2024-05-01 12:15:30");
//! ```

mod rules;

pub use rules::{match_rule, rules, DateFormatRule, RuleMatch};

use crate::config::NormalizeOptions;
use chrono::{NaiveDateTime, TimeDelta};
use std::fmt::Write as _;
use thiserror::Error;

/// Errors that can occur while normalizing a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The input contains none of the accepted date representations.
    #[error("'{input}' does not match any accepted date format")]
    UnrecognizedDateFormat {
        /// The rejected input.
        input: String,
    },

    /// The input has the right shape but is not a real calendar date.
    #[error("'{input}' is not a valid {rule} date: {reason}")]
    InvalidDate {
        /// The rejected input.
        input: String,
        /// Name of the rule whose layout was applied.
        rule: &'static str,
        /// Why `chrono` refused it.
        reason: String,
    },

    /// Applying the timezone offset left the representable range.
    #[error("shifting '{input}' by {offset_hours}h is out of range")]
    OutOfRange {
        /// The input being shifted.
        input: String,
        /// The requested offset.
        offset_hours: i32,
    },

    /// The output layout contains an unsupported specifier.
    #[error("invalid output layout '{layout}'")]
    InvalidLayout {
        /// The rejected layout.
        layout: String,
    },
}

/// Parses the first accepted date representation found in `input` and shifts
/// it by `offset_hours`.
///
/// # Errors
///
/// Returns [`DateError::UnrecognizedDateFormat`] when no rule matches,
/// [`DateError::InvalidDate`] when the matched text is not a calendar date and
/// [`DateError::OutOfRange`] when the offset overflows.
pub fn parse(input: &str, offset_hours: i32) -> Result<NaiveDateTime, DateError> {
    let RuleMatch { rule, text } =
        match_rule(input).ok_or_else(|| DateError::UnrecognizedDateFormat {
            input: input.to_string(),
        })?;

    let parsed =
        NaiveDateTime::parse_from_str(text, rule.layout).map_err(|e| DateError::InvalidDate {
            input: input.to_string(),
            rule: rule.name,
            reason: e.to_string(),
        })?;

    parsed
        .checked_add_signed(TimeDelta::hours(i64::from(offset_hours)))
        .ok_or_else(|| DateError::OutOfRange {
            input: input.to_string(),
            offset_hours,
        })
}

/// Renders `value` with a `chrono` strftime layout.
///
/// # Errors
///
/// Returns [`DateError::InvalidLayout`] if the layout cannot be rendered.
pub fn render(value: NaiveDateTime, layout: &str) -> Result<String, DateError> {
    let mut rendered = String::new();
    write!(rendered, "{}", value.format(layout)).map_err(|_| DateError::InvalidLayout {
        layout: layout.to_string(),
    })?;
    Ok(rendered)
}

/// Normalizes a timestamp string according to `options`.
///
/// # Errors
///
/// Returns an error if the input is not an accepted date, the offset
/// overflows, or the output layout is invalid.
pub fn normalize(input: &str, options: &NormalizeOptions) -> Result<String, DateError> {
    let value = parse(input, options.timezone_offset_hours)?;
    render(value, &options.output_format)
}
