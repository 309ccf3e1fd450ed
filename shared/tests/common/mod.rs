//! Common test utilities and helpers for integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockito::{Matcher, Server};

use shared::config::ConnectionConfig;
use shared::query::LastPointQuery;

/// Fixed "now" used by deterministic tests.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Connection configuration pointing at a mock server.
pub fn config_for(server: &Server) -> ConnectionConfig {
    let address = server.host_with_port();
    let (host, port) = address.rsplit_once(':').unwrap();
    ConnectionConfig::new(host, port.parse().unwrap())
}

/// Matches a `/query` request carrying `statement`, optionally run against
/// `database`.
pub fn statement(statement: &str, database: Option<&str>) -> Matcher {
    let mut matchers = vec![Matcher::UrlEncoded("q".into(), statement.into())];
    if let Some(database) = database {
        matchers.push(Matcher::UrlEncoded("db".into(), database.into()));
    }
    Matcher::AllOf(matchers)
}

/// The last-point statement issued for `measurement` by a check at
/// [`fixed_now`] over `interval_minutes`.
pub fn last_point_statement(measurement: &str, interval_minutes: i64) -> String {
    let now = fixed_now();
    LastPointQuery::new(measurement, now - Duration::minutes(interval_minutes), now).to_string()
}

/// Wraps series JSON in an InfluxDB `/query` response envelope.
pub fn envelope(series: &str) -> String {
    format!(r#"{{"results":[{{"statement_id":0,"series":[{series}]}}]}}"#)
}

/// An InfluxDB response for a statement that matched nothing.
pub fn empty_envelope() -> String {
    r#"{"results":[{"statement_id":0}]}"#.to_string()
}
