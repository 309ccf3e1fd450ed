//! InfluxQL statements issued by the staleness reporter.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use shared::query::LastPointQuery;
//!
//! let until = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
//! let query = LastPointQuery::new("cpu", until - chrono::Duration::minutes(60), until);
//!
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT * FROM \"cpu\" WHERE time >= '2024-05-01T09:00:00Z' \
//!      AND time <= '2024-05-01T10:00:00Z' GROUP BY * ORDER BY DESC LIMIT 1"
//! );
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// Lists every database on the server.
pub const SHOW_DATABASES: &str = "SHOW DATABASES";

/// Lists the measurements of the current database.
pub const SHOW_MEASUREMENTS: &str = "SHOW MEASUREMENTS";

static LAST_POINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^SELECT \* FROM "((?:[^"\\]|\\.)*)" WHERE time >= '([^']*)' AND time <= '([^']*)' GROUP BY \* ORDER BY DESC LIMIT 1$"#,
    )
    .expect("last point pattern is a valid regular expression")
});

/// Selects the most recent point of a measurement per tag set inside a time
/// window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPointQuery {
    /// Measurement queried.
    pub measurement: String,
    /// Inclusive lower bound.
    pub since: DateTime<Utc>,
    /// Inclusive upper bound.
    pub until: DateTime<Utc>,
}

impl LastPointQuery {
    /// Creates a query over `[since, until]`.
    #[must_use]
    pub fn new(measurement: impl Into<String>, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            since,
            until,
        }
    }

    /// Recognizes a statement rendered by this type.
    ///
    /// Returns `None` for anything else.
    #[must_use]
    pub fn parse(statement: &str) -> Option<Self> {
        let captures = LAST_POINT.captures(statement.trim())?;
        let measurement = unquote_identifier(captures.get(1)?.as_str());
        let since = parse_bound(captures.get(2)?.as_str())?;
        let until = parse_bound(captures.get(3)?.as_str())?;
        Some(Self {
            measurement,
            since,
            until,
        })
    }
}

impl std::fmt::Display for LastPointQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SELECT * FROM {} WHERE time >= '{}' AND time <= '{}' GROUP BY * ORDER BY DESC LIMIT 1",
            quote_identifier(&self.measurement),
            format_bound(self.since),
            format_bound(self.until),
        )
    }
}

/// Double-quotes an identifier, escaping backslashes and quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn unquote_identifier(escaped: &str) -> String {
    let mut name = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                name.push(next);
            }
        } else {
            name.push(c);
        }
    }
    name
}

fn format_bound(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_bound(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|value| value.with_timezone(&Utc))
}
