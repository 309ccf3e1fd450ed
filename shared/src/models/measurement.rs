//! Measurement references and the per-database measurement catalog.

use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

/// Identifies one measurement inside one database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub struct MeasurementRef {
    /// Database holding the measurement.
    pub database: String,
    /// Measurement name.
    pub measurement: String,
}

impl MeasurementRef {
    /// Creates a new measurement reference.
    #[must_use]
    pub fn new(database: impl Into<String>, measurement: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            measurement: measurement.into(),
        }
    }
}

impl std::fmt::Display for MeasurementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.database, self.measurement)
    }
}

/// The measurements of a single database, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseMeasurements {
    /// Database name.
    pub database: String,
    /// Measurement names.
    pub measurements: Vec<String>,
}

/// Ordered mapping from database name to its measurement names.
///
/// Databases keep the order in which they were inserted; nothing is re-sorted.
/// Serializes as a JSON object in that same order.
///
/// # Example
///
/// ```
/// use shared::models::MeasurementCatalog;
///
/// let mut catalog = MeasurementCatalog::new();
/// catalog.insert("telegraf", vec!["cpu".to_string(), "mem".to_string()]);
/// catalog.insert("app", vec!["requests".to_string()]);
///
/// assert_eq!(catalog.databases().collect::<Vec<_>>(), vec!["telegraf", "app"]);
/// assert_eq!(catalog.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementCatalog {
    entries: Vec<DatabaseMeasurements>,
}

impl MeasurementCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds measurements for a database.
    ///
    /// Inserting a database twice appends to its existing list.
    pub fn insert(&mut self, database: impl Into<String>, measurements: Vec<String>) {
        let database = database.into();
        match self.entries.iter_mut().find(|e| e.database == database) {
            Some(entry) => entry.measurements.extend(measurements),
            None => self.entries.push(DatabaseMeasurements {
                database,
                measurements,
            }),
        }
    }

    /// Returns the measurements of `database`, if present.
    #[must_use]
    pub fn get(&self, database: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.database == database)
            .map(|e| e.measurements.as_slice())
    }

    /// Iterates over database names in insertion order.
    pub fn databases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.database.as_str())
    }

    /// Iterates over the per-database entries.
    pub fn iter(&self) -> impl Iterator<Item = &DatabaseMeasurements> {
        self.entries.iter()
    }

    /// Iterates over every (database, measurement) pair, database first.
    pub fn refs(&self) -> impl Iterator<Item = MeasurementRef> + '_ {
        self.entries.iter().flat_map(|entry| {
            entry
                .measurements
                .iter()
                .map(|m| MeasurementRef::new(entry.database.clone(), m.clone()))
        })
    }

    /// Returns the total number of measurements across all databases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.measurements.len()).sum()
    }

    /// Returns true if the catalog holds no measurements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<MeasurementRef> for MeasurementCatalog {
    fn from_iter<I: IntoIterator<Item = MeasurementRef>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for target in iter {
            catalog.insert(target.database, vec![target.measurement]);
        }
        catalog
    }
}

impl Serialize for MeasurementCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.entries
                .iter()
                .map(|e| (e.database.as_str(), &e.measurements)),
        )
    }
}
