//! Single-measurement staleness check.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use super::{ReportError, StalenessReporter};
use crate::client::{QueryResult, TimeSeriesClient};
use crate::date;
use crate::models::{MeasurementRef, StalenessReport};
use crate::query::LastPointQuery;

const TIME_COLUMN: &str = "time";

impl<C: TimeSeriesClient> StalenessReporter<C> {
    /// Checks how long ago `target` last received data, looking back
    /// `interval_minutes` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the returned timestamp cannot be
    /// normalized.
    pub fn check(
        &mut self,
        target: &MeasurementRef,
        interval_minutes: u32,
    ) -> Result<StalenessReport, ReportError> {
        self.check_at(target, interval_minutes, Utc::now())
    }

    /// Same as [`check`](Self::check) with an explicit current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the returned timestamp cannot be
    /// normalized.
    pub fn check_at(
        &mut self,
        target: &MeasurementRef,
        interval_minutes: u32,
        now: DateTime<Utc>,
    ) -> Result<StalenessReport, ReportError> {
        let since = now - Duration::minutes(i64::from(interval_minutes));
        let query = LastPointQuery::new(target.measurement.clone(), since, now);

        self.client.switch_database(&target.database);
        let result = self.client.query(&query.to_string())?;

        let offset = self.normalize.timezone_offset_hours;
        let Some((raw, last)) = latest_point(&result, offset)? else {
            tracing::debug!(%target, interval_minutes, "No point inside lookback window");
            return Ok(StalenessReport::not_found(target, interval_minutes));
        };

        // The clock goes through the same normalization as the point so both
        // sides share whole-second precision.
        let now = date::parse(&now.naive_utc().to_string(), offset)?;
        let minutes_since_last = elapsed_minutes(last, now);

        tracing::debug!(
            %target,
            last_timestamp = %raw,
            minutes_since_last,
            "Found latest point"
        );

        Ok(StalenessReport::found(
            target,
            interval_minutes,
            raw,
            minutes_since_last,
        ))
    }
}

/// Picks the newest point across every returned series.
///
/// With `GROUP BY *` the server returns one series per tag set, each holding
/// its own newest row.
fn latest_point(
    result: &QueryResult,
    offset_hours: i32,
) -> Result<Option<(String, NaiveDateTime)>, ReportError> {
    let mut latest: Option<(String, NaiveDateTime)> = None;

    for series in &result.series {
        let column = series.column_index(TIME_COLUMN).unwrap_or(0);
        for row in &series.values {
            let raw = row.get(column).and_then(|v| v.as_str()).ok_or_else(|| {
                ReportError::Query(format!(
                    "series '{}' has no textual time value",
                    series.name
                ))
            })?;
            let parsed = date::parse(raw, offset_hours)?;

            if latest.as_ref().map_or(true, |(_, newest)| parsed > *newest) {
                latest = Some((raw.to_string(), parsed));
            }
        }
    }

    Ok(latest)
}

#[allow(clippy::cast_precision_loss)]
fn elapsed_minutes(last: NaiveDateTime, now: NaiveDateTime) -> f64 {
    now.signed_duration_since(last).num_seconds() as f64 / 60.0
}
