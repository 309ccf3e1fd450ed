//! Database and measurement enumeration.

use super::{ReportError, StalenessReporter};
use crate::client::TimeSeriesClient;
use crate::models::MeasurementCatalog;
use crate::query::SHOW_MEASUREMENTS;

/// A database that could not be enumerated.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseFailure {
    /// The database.
    pub database: String,
    /// What went wrong.
    pub error: ReportError,
}

/// Result of enumerating measurements.
///
/// Databases that failed are absent from `catalog` and listed in `failures`,
/// so an incomplete catalog can be told apart from a complete one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enumeration {
    /// Measurements per database, in server order.
    pub catalog: MeasurementCatalog,
    /// Databases skipped and why.
    pub failures: Vec<DatabaseFailure>,
}

impl Enumeration {
    /// Returns true if every database was enumerated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<C: TimeSeriesClient> StalenessReporter<C> {
    /// Lists databases in server order, leaving out every name in `exclude`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Authentication`] or [`ReportError::Connection`]
    /// when the server cannot be queried at all.
    pub fn list_databases(&mut self, exclude: &[String]) -> Result<Vec<String>, ReportError> {
        let databases = self.client.list_databases().map_err(|e| {
            let error = ReportError::from(e);
            tracing::error!(error = %error, "Failed to list databases");
            error
        })?;

        let total = databases.len();
        let kept: Vec<String> = databases
            .into_iter()
            .filter(|name| !exclude.contains(name))
            .collect();

        tracing::debug!(total, kept = kept.len(), "Listed databases");
        Ok(kept)
    }

    /// Lists the measurements of each database, in the given order.
    ///
    /// A database that has no measurements or whose listing fails is recorded
    /// in [`Enumeration::failures`]; the remaining databases are still
    /// enumerated.
    pub fn list_measurements(&mut self, databases: &[String]) -> Enumeration {
        let mut enumeration = Enumeration::default();

        for database in databases {
            match self.measurements_of(database) {
                Ok(measurements) => {
                    tracing::debug!(
                        database = %database,
                        count = measurements.len(),
                        "Listed measurements"
                    );
                    enumeration.catalog.insert(database.clone(), measurements);
                }
                Err(error) => {
                    tracing::warn!(database = %database, error = %error, "Skipping database");
                    enumeration.failures.push(DatabaseFailure {
                        database: database.clone(),
                        error,
                    });
                }
            }
        }

        enumeration
    }

    /// Lists databases (minus `exclude`) and their measurements.
    ///
    /// # Errors
    ///
    /// Returns an error if the database list itself cannot be fetched. Failures
    /// of individual databases are reported in the returned [`Enumeration`].
    pub fn enumerate(&mut self, exclude: &[String]) -> Result<Enumeration, ReportError> {
        let databases = self.list_databases(exclude)?;
        Ok(self.list_measurements(&databases))
    }

    fn measurements_of(&mut self, database: &str) -> Result<Vec<String>, ReportError> {
        self.client.switch_database(database);
        let measurements = self.client.query(SHOW_MEASUREMENTS)?.first_column();
        if measurements.is_empty() {
            return Err(ReportError::EmptyMeasurement {
                database: database.to_string(),
            });
        }
        Ok(measurements)
    }
}
