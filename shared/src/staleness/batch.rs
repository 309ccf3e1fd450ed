//! Batch staleness checks over a measurement catalog.

use chrono::{DateTime, Utc};

use super::{ReportError, StalenessReporter};
use crate::client::TimeSeriesClient;
use crate::models::{MeasurementCatalog, MeasurementRef, StalenessReport};

/// A measurement left out of a batch because its check failed.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMeasurement {
    /// The measurement.
    pub target: MeasurementRef,
    /// Why it was skipped.
    pub error: ReportError,
}

/// Outcome of checking a whole catalog.
///
/// `reports` holds only successful checks, in catalog order. A measurement
/// listed in `skipped` has unknown staleness: it is neither fresh nor stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Successful reports, database then measurement order.
    pub reports: Vec<StalenessReport>,
    /// Measurements whose check failed.
    pub skipped: Vec<SkippedMeasurement>,
}

impl BatchReport {
    /// Returns true if every measurement was checked.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Returns the reports whose latest point is older than `threshold_minutes`
    /// or missing altogether.
    pub fn stale(&self, threshold_minutes: f64) -> impl Iterator<Item = &StalenessReport> {
        self.reports
            .iter()
            .filter(move |report| report.is_stale(threshold_minutes))
    }
}

impl<C: TimeSeriesClient> StalenessReporter<C> {
    /// Checks every measurement of `catalog` with a lookback window of
    /// `interval_minutes`.
    pub fn run(&mut self, catalog: &MeasurementCatalog, interval_minutes: u32) -> BatchReport {
        self.run_at(catalog, interval_minutes, Utc::now())
    }

    /// Same as [`run`](Self::run) with an explicit current time shared by
    /// every check of the batch.
    pub fn run_at(
        &mut self,
        catalog: &MeasurementCatalog,
        interval_minutes: u32,
        now: DateTime<Utc>,
    ) -> BatchReport {
        let mut batch = BatchReport::default();

        for target in catalog.refs() {
            match self.check_at(&target, interval_minutes, now) {
                Ok(report) => batch.reports.push(report),
                Err(error) => {
                    tracing::warn!(%target, error = %error, "Skipping measurement");
                    batch.skipped.push(SkippedMeasurement { target, error });
                }
            }
        }

        tracing::info!(
            checked = batch.reports.len(),
            skipped = batch.skipped.len(),
            interval_minutes,
            "Staleness batch finished"
        );

        batch
    }
}
