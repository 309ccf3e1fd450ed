//! In-memory time-series client for development and testing.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::BTreeMap;

use super::{ClientError, QueryResult, Series, TimeSeriesClient};
use crate::query::{LastPointQuery, SHOW_DATABASES, SHOW_MEASUREMENTS};

#[derive(Debug, Clone)]
struct Point {
    time: DateTime<Utc>,
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
struct Measurement {
    name: String,
    points: Vec<Point>,
    failure: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Database {
    name: String,
    measurements: Vec<Measurement>,
}

/// Time-series client answering from in-process data.
///
/// Understands `SHOW DATABASES`, `SHOW MEASUREMENTS` and the statements built
/// by [`LastPointQuery`]. Failures can be injected per measurement or for the
/// whole client.
///
/// **Note:** Data only lives as long as the client.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use shared::client::{InMemoryClient, TimeSeriesClient};
///
/// let mut client = InMemoryClient::new()
///     .with_point("telegraf", "cpu", Utc::now())
///     .with_database("empty");
///
/// assert_eq!(client.list_databases().unwrap(), vec!["telegraf", "empty"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    databases: Vec<Database>,
    current: Option<String>,
    outage: Option<ClientError>,
    executed: Vec<String>,
}

impl InMemoryClient {
    /// Creates a client without databases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an empty database.
    #[must_use]
    pub fn with_database(mut self, database: &str) -> Self {
        self.database_mut(database);
        self
    }

    /// Adds a measurement without points.
    #[must_use]
    pub fn with_measurement(mut self, database: &str, measurement: &str) -> Self {
        self.measurement_mut(database, measurement);
        self
    }

    /// Adds an untagged point.
    #[must_use]
    pub fn with_point(self, database: &str, measurement: &str, time: DateTime<Utc>) -> Self {
        self.with_tagged_point(database, measurement, time, &[])
    }

    /// Adds a point with tags.
    #[must_use]
    pub fn with_tagged_point(
        mut self,
        database: &str,
        measurement: &str,
        time: DateTime<Utc>,
        tags: &[(&str, &str)],
    ) -> Self {
        let tags = tags
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.measurement_mut(database, measurement)
            .points
            .push(Point { time, tags });
        self
    }

    /// Makes every query against `measurement` fail with a query error.
    #[must_use]
    pub fn with_failing_measurement(mut self, database: &str, measurement: &str) -> Self {
        self.measurement_mut(database, measurement).failure =
            Some(format!("simulated failure for {database}/{measurement}"));
        self
    }

    /// Makes every operation fail with `error`, e.g. to simulate an outage.
    #[must_use]
    pub fn with_outage(mut self, error: ClientError) -> Self {
        self.outage = Some(error);
        self
    }

    /// Returns the current database.
    #[must_use]
    pub fn current_database(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Returns every statement executed so far, prefixed with the database it
    /// ran against (`db> statement`).
    #[must_use]
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    fn database_mut(&mut self, name: &str) -> &mut Database {
        let index = match self.databases.iter().position(|d| d.name == name) {
            Some(index) => index,
            None => {
                self.databases.push(Database {
                    name: name.to_string(),
                    measurements: Vec::new(),
                });
                self.databases.len() - 1
            }
        };
        &mut self.databases[index]
    }

    fn measurement_mut(&mut self, database: &str, name: &str) -> &mut Measurement {
        let database = self.database_mut(database);
        let index = match database.measurements.iter().position(|m| m.name == name) {
            Some(index) => index,
            None => {
                database.measurements.push(Measurement {
                    name: name.to_string(),
                    ..Measurement::default()
                });
                database.measurements.len() - 1
            }
        };
        &mut database.measurements[index]
    }

    fn current(&self) -> Result<&Database, ClientError> {
        let name = self
            .current
            .as_deref()
            .ok_or_else(|| ClientError::Query("database name required".to_string()))?;
        self.databases
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ClientError::Query(format!("database not found: {name}")))
    }

    fn show_measurements(&self) -> Result<QueryResult, ClientError> {
        let database = self.current()?;
        if database.measurements.is_empty() {
            return Ok(QueryResult::default());
        }

        Ok(QueryResult::new(vec![Series {
            name: "measurements".to_string(),
            columns: vec!["name".to_string()],
            values: database
                .measurements
                .iter()
                .map(|m| vec![Value::String(m.name.clone())])
                .collect(),
            ..Series::default()
        }]))
    }

    fn last_point(&self, query: &LastPointQuery) -> Result<QueryResult, ClientError> {
        let database = self.current()?;
        let Some(measurement) = database
            .measurements
            .iter()
            .find(|m| m.name == query.measurement)
        else {
            return Ok(QueryResult::default());
        };

        if let Some(failure) = &measurement.failure {
            return Err(ClientError::Query(failure.clone()));
        }

        // One series per tag set, each holding its newest point in the window.
        let mut latest: BTreeMap<&BTreeMap<String, String>, DateTime<Utc>> = BTreeMap::new();
        for point in &measurement.points {
            if point.time < query.since || point.time > query.until {
                continue;
            }
            let newest = latest.entry(&point.tags).or_insert(point.time);
            if point.time > *newest {
                *newest = point.time;
            }
        }

        let series = latest
            .into_iter()
            .map(|(tags, time)| Series {
                name: measurement.name.clone(),
                tags: tags.clone(),
                columns: vec!["time".to_string()],
                values: vec![vec![Value::String(
                    time.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                )]],
            })
            .collect();

        Ok(QueryResult::new(series))
    }
}

impl TimeSeriesClient for InMemoryClient {
    fn list_databases(&mut self) -> Result<Vec<String>, ClientError> {
        self.executed.push(format!("> {SHOW_DATABASES}"));
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }
        Ok(self.databases.iter().map(|d| d.name.clone()).collect())
    }

    fn switch_database(&mut self, name: &str) {
        self.current = Some(name.to_string());
    }

    fn query(&mut self, statement: &str) -> Result<QueryResult, ClientError> {
        self.executed.push(format!(
            "{}> {statement}",
            self.current.as_deref().unwrap_or("")
        ));
        if let Some(error) = &self.outage {
            return Err(error.clone());
        }

        let statement = statement.trim();
        if statement.eq_ignore_ascii_case(SHOW_DATABASES) {
            let names = self
                .databases
                .iter()
                .map(|d| vec![Value::String(d.name.clone())])
                .collect();
            return Ok(QueryResult::new(vec![Series {
                name: "databases".to_string(),
                columns: vec!["name".to_string()],
                values: names,
                ..Series::default()
            }]));
        }
        if statement.eq_ignore_ascii_case(SHOW_MEASUREMENTS) {
            return self.show_measurements();
        }
        if let Some(query) = LastPointQuery::parse(statement) {
            return self.last_point(&query);
        }

        Err(ClientError::Query(format!(
            "error parsing query: unsupported statement '{statement}'"
        )))
    }
}
