//! Staleness report model.

use serde::Serialize;

use super::MeasurementRef;

/// Outcome of a staleness query.
///
/// Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum ResultCode {
    /// At least one point was found inside the lookback window.
    Found,
    /// No point was found inside the lookback window.
    NotFound,
}

impl ResultCode {
    /// Returns the numeric code (`0` found, `1` not found).
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Found => 0,
            Self::NotFound => 1,
        }
    }
}

impl From<ResultCode> for u8 {
    fn from(code: ResultCode) -> Self {
        code.code()
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found => write!(f, "found"),
            Self::NotFound => write!(f, "not_found"),
        }
    }
}

/// How long ago a measurement last received data.
///
/// Built only through [`StalenessReport::found`] and
/// [`StalenessReport::not_found`], so a not-found report never carries
/// timestamp fields.
///
/// # Example
///
/// ```
/// use shared::models::{MeasurementRef, ResultCode, StalenessReport};
///
/// let target = MeasurementRef::new("telegraf", "cpu");
/// let report = StalenessReport::not_found(&target, 60);
///
/// assert_eq!(report.result_code(), ResultCode::NotFound);
/// assert!(report.last_timestamp().is_none());
/// assert!(report.minutes_since_last().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StalenessReport {
    database: String,
    measurement: String,
    result_code: ResultCode,
    interval_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minutes_since_last: Option<f64>,
}

impl StalenessReport {
    /// Creates a report for a measurement whose latest point was found.
    #[must_use]
    pub fn found(
        target: &MeasurementRef,
        interval_minutes: u32,
        last_timestamp: impl Into<String>,
        minutes_since_last: f64,
    ) -> Self {
        Self {
            database: target.database.clone(),
            measurement: target.measurement.clone(),
            result_code: ResultCode::Found,
            interval_minutes,
            last_timestamp: Some(last_timestamp.into()),
            minutes_since_last: Some(minutes_since_last),
        }
    }

    /// Creates a report for a measurement without points in the window.
    #[must_use]
    pub fn not_found(target: &MeasurementRef, interval_minutes: u32) -> Self {
        Self {
            database: target.database.clone(),
            measurement: target.measurement.clone(),
            result_code: ResultCode::NotFound,
            interval_minutes,
            last_timestamp: None,
            minutes_since_last: None,
        }
    }

    /// Database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Measurement name.
    #[must_use]
    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Whether a point was found.
    #[must_use]
    pub fn result_code(&self) -> ResultCode {
        self.result_code
    }

    /// Lookback window used by the query, in minutes.
    #[must_use]
    pub fn interval_minutes(&self) -> u32 {
        self.interval_minutes
    }

    /// Timestamp of the latest point exactly as the server returned it.
    #[must_use]
    pub fn last_timestamp(&self) -> Option<&str> {
        self.last_timestamp.as_deref()
    }

    /// Minutes elapsed between the latest point and the check.
    #[must_use]
    pub fn minutes_since_last(&self) -> Option<f64> {
        self.minutes_since_last
    }

    /// Returns the measurement this report describes.
    #[must_use]
    pub fn target(&self) -> MeasurementRef {
        MeasurementRef::new(self.database.clone(), self.measurement.clone())
    }

    /// Returns true if no point was found, or the latest point is older than
    /// `threshold_minutes`.
    #[must_use]
    pub fn is_stale(&self, threshold_minutes: f64) -> bool {
        match self.minutes_since_last {
            Some(minutes) => minutes > threshold_minutes,
            None => true,
        }
    }
}
