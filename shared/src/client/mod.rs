//! Time-series client abstraction and implementations.
//!
//! The `TimeSeriesClient` trait is the minimal capability the staleness
//! reporter needs from a database: list databases, switch the current
//! database and run a query. Two implementations are provided:
//! - [`InfluxClient`] talks to an InfluxDB 1.x server over HTTP.
//! - [`InMemoryClient`] answers from in-process data, for development and
//!   testing.

mod influx;
mod memory;

pub use influx::InfluxClient;
pub use memory::InMemoryClient;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by a time-series client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server rejected or failed the statement.
    #[error("Query failed: {0}")]
    Query(String),

    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    Decode(String),
}

/// One series of a query result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Measurement (or pseudo-measurement) name.
    #[serde(default)]
    pub name: String,
    /// Tag set identifying the series when grouped by tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Column names.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows, one value per column.
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl Series {
    /// Returns the position of `column`, if present.
    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

/// Series returned by a statement. Empty when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// The returned series.
    #[serde(default)]
    pub series: Vec<Series>,
}

impl QueryResult {
    /// Creates a result from its series.
    #[must_use]
    pub fn new(series: Vec<Series>) -> Self {
        Self { series }
    }

    /// Returns true if no rows were returned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.values.is_empty())
    }

    /// Collects the first column of every row as strings, across all series.
    ///
    /// This is the shape of `SHOW DATABASES` and `SHOW MEASUREMENTS`.
    #[must_use]
    pub fn first_column(&self) -> Vec<String> {
        self.series
            .iter()
            .flat_map(|s| s.values.iter())
            .filter_map(|row| row.first().and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }
}

/// Minimal capability interface of a time-series database client.
///
/// The client has a current database that [`switch_database`] changes and
/// [`query`] reads, so all methods take `&mut self`: one instance never has
/// two operations in flight.
///
/// [`switch_database`]: TimeSeriesClient::switch_database
/// [`query`]: TimeSeriesClient::query
pub trait TimeSeriesClient {
    /// Lists database names in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the server is unreachable or
    /// the response cannot be decoded.
    fn list_databases(&mut self) -> Result<Vec<String>, ClientError>;

    /// Makes `name` the database subsequent queries run against.
    fn switch_database(&mut self, name: &str);

    /// Runs a statement against the current database.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails, the server is unreachable,
    /// the statement fails or the response cannot be decoded.
    fn query(&mut self, statement: &str) -> Result<QueryResult, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_column_across_series() {
        let result = QueryResult::new(vec![
            Series {
                name: "measurements".to_string(),
                columns: vec!["name".to_string()],
                values: vec![vec![json!("cpu")], vec![json!("mem")]],
                ..Series::default()
            },
            Series {
                name: "measurements".to_string(),
                columns: vec!["name".to_string()],
                values: vec![vec![json!("disk")], vec![json!(42)]],
                ..Series::default()
            },
        ]);

        assert_eq!(result.first_column(), vec!["cpu", "mem", "disk"]);
        assert!(!result.is_empty());
    }

    #[test]
    fn test_empty_result() {
        assert!(QueryResult::default().is_empty());

        let only_headers = QueryResult::new(vec![Series {
            columns: vec!["time".to_string()],
            ..Series::default()
        }]);
        assert!(only_headers.is_empty());
        assert!(only_headers.first_column().is_empty());
    }

    #[test]
    fn test_column_index() {
        let series = Series {
            columns: vec!["value".to_string(), "time".to_string()],
            ..Series::default()
        };
        assert_eq!(series.column_index("time"), Some(1));
        assert_eq!(series.column_index("host"), None);
    }

    #[test]
    fn test_series_deserializes_with_missing_fields() {
        let series: Series = serde_json::from_value(json!({
            "name": "cpu",
            "columns": ["time", "usage"],
            "values": [["2024-05-01T10:00:00Z", 12.5]]
        }))
        .unwrap();

        assert_eq!(series.name, "cpu");
        assert!(series.tags.is_empty());
        assert_eq!(series.values.len(), 1);
    }

    #[test]
    fn test_client_error_display() {
        assert_eq!(
            ClientError::Authentication("authorization failed".to_string()).to_string(),
            "Authentication failed: authorization failed"
        );
        assert_eq!(
            ClientError::Connection("localhost:8086: refused".to_string()).to_string(),
            "Connection failed: localhost:8086: refused"
        );
    }
}
