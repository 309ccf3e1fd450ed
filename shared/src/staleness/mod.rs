//! Staleness reporting.
//!
//! [`StalenessReporter`] wraps a single [`TimeSeriesClient`] and answers "how
//! long ago did each measurement last receive data?":
//!
//! 1. [`StalenessReporter::enumerate`] lists databases (minus exclusions) and
//!    their measurements.
//! 2. [`StalenessReporter::check`] queries the newest point of one measurement
//!    inside a lookback window.
//! 3. [`StalenessReporter::run`] checks every measurement of a catalog and
//!    collects the reports.
//!
//! All calls are sequential and blocking; the reporter owns its client, so a
//! client is never shared across concurrent callers.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use shared::client::InMemoryClient;
//! use shared::models::ResultCode;
//! use shared::staleness::StalenessReporter;
//!
//! let client = InMemoryClient::new()
//!     .with_point("telegraf", "cpu", Utc::now() - Duration::minutes(5))
//!     .with_database("_internal");
//!
//! let mut reporter = StalenessReporter::new(client);
//! let enumeration = reporter.enumerate(&["_internal".to_string()]).unwrap();
//! let batch = reporter.run(&enumeration.catalog, 60);
//!
//! assert_eq!(batch.reports.len(), 1);
//! assert_eq!(batch.reports[0].result_code(), ResultCode::Found);
//! ```

mod batch;
mod checker;
mod enumerator;

pub use batch::{BatchReport, SkippedMeasurement};
pub use enumerator::{DatabaseFailure, Enumeration};

use crate::client::{ClientError, TimeSeriesClient};
use crate::config::NormalizeOptions;
use crate::date::DateError;
use thiserror::Error;

/// Errors reported while enumerating or checking measurements.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// A timestamp matched none of the accepted date formats, or could not
    /// be normalized.
    #[error("Unusable timestamp: {0}")]
    Date(#[from] DateError),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A database has no measurements.
    #[error("Database {database} does not contain any measurement")]
    EmptyMeasurement {
        /// The empty database.
        database: String,
    },

    /// A statement failed or returned something unusable.
    #[error("Query failed: {0}")]
    Query(String),
}

impl From<ClientError> for ReportError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Authentication(msg) => Self::Authentication(msg),
            ClientError::Connection(msg) => Self::Connection(msg),
            ClientError::Query(msg) => Self::Query(msg),
            ClientError::Decode(msg) => Self::Query(format!("invalid response: {msg}")),
        }
    }
}

impl ReportError {
    /// Returns true if the failure concerns the connection as a whole rather
    /// than a single database or measurement.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Authentication(_) | Self::Connection(_))
    }
}

/// Reports how long ago measurements last received data.
///
/// Holds exactly one client, injected at construction. Timestamps from the
/// server and the local clock are both normalized with the same
/// [`NormalizeOptions`] before they are compared.
#[derive(Debug)]
pub struct StalenessReporter<C> {
    client: C,
    normalize: NormalizeOptions,
}

impl<C: TimeSeriesClient> StalenessReporter<C> {
    /// Creates a reporter over `client`.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            normalize: NormalizeOptions::default(),
        }
    }

    /// Sets the options used to normalize timestamps before comparison.
    #[must_use]
    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }

    /// Returns the underlying client.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_from_client_error() {
        assert_eq!(
            ReportError::from(ClientError::Authentication("denied".to_string())),
            ReportError::Authentication("denied".to_string())
        );
        assert_eq!(
            ReportError::from(ClientError::Connection("refused".to_string())),
            ReportError::Connection("refused".to_string())
        );
        assert_eq!(
            ReportError::from(ClientError::Decode("eof".to_string())),
            ReportError::Query("invalid response: eof".to_string())
        );
    }

    #[test]
    fn test_report_error_from_date_error() {
        let err: ReportError = DateError::UnrecognizedDateFormat {
            input: "garbage".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Unusable timestamp: 'garbage' does not match any accepted date format"
        );
    }

    #[test]
    fn test_is_transport() {
        assert!(ReportError::Authentication(String::new()).is_transport());
        assert!(ReportError::Connection(String::new()).is_transport());
        assert!(!ReportError::Query(String::new()).is_transport());
        assert!(!ReportError::EmptyMeasurement {
            database: "db".to_string()
        }
        .is_transport());
    }

    #[test]
    fn test_empty_measurement_display() {
        let err = ReportError::EmptyMeasurement {
            database: "scratch".to_string(),
        };
        assert_eq!(err.to_string(), "Database scratch does not contain any measurement");
    }
}
