//! Blocking InfluxDB 1.x HTTP client.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use super::{ClientError, QueryResult, Series, TimeSeriesClient};
use crate::config::ConnectionConfig;
use crate::query::SHOW_DATABASES;

/// InfluxDB 1.x client speaking the `/query` HTTP endpoint.
///
/// Requests are blocking and carry the configured timeout. Credentials, when
/// configured, are sent as HTTP Basic authentication.
///
/// # Example
///
/// ```no_run
/// use shared::client::{InfluxClient, TimeSeriesClient};
/// use shared::config::ConnectionConfig;
///
/// let config = ConnectionConfig::new("localhost", 8086).with_credentials("monitor", "secret");
/// let mut client = InfluxClient::new(&config);
/// let databases = client.list_databases()?;
/// # Ok::<(), shared::client::ClientError>(())
/// ```
pub struct InfluxClient {
    agent: ureq::Agent,
    query_url: String,
    address: String,
    username: String,
    authorization: Option<String>,
    database: Option<String>,
}

impl InfluxClient {
    /// Creates a client from connection configuration.
    #[must_use]
    pub fn new(config: &ConnectionConfig) -> Self {
        let tls = ureq::tls::TlsConfig::builder()
            .disable_verification(!config.verify_ssl)
            .build();

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout()))
            .http_status_as_error(false)
            .tls_config(tls)
            .build()
            .into();

        let authorization = config.has_credentials().then(|| {
            let token = STANDARD.encode(format!("{}:{}", config.username, config.password));
            format!("Basic {token}")
        });

        Self {
            agent,
            query_url: format!("{}/query", config.base_url()),
            address: format!("{}:{}", config.host, config.port),
            username: config.username.clone(),
            authorization,
            database: None,
        }
    }

    /// Returns the database queries currently run against.
    #[must_use]
    pub fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    fn execute(&self, statement: &str) -> Result<QueryResult, ClientError> {
        let mut request = self.agent.get(self.query_url.as_str()).query("q", statement);
        if let Some(database) = &self.database {
            request = request.query("db", database);
        }
        if let Some(authorization) = &self.authorization {
            request = request.header("Authorization", authorization.as_str());
        }

        tracing::debug!(
            database = self.database.as_deref().unwrap_or(""),
            statement,
            "Executing InfluxQL statement"
        );

        let mut response = request
            .call()
            .map_err(|e| ClientError::Connection(format!("{}: {e}", self.address)))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        check_status(status, &body, &self.username)?;
        decode_response(&body)
    }
}

impl TimeSeriesClient for InfluxClient {
    fn list_databases(&mut self) -> Result<Vec<String>, ClientError> {
        Ok(self.execute(SHOW_DATABASES)?.first_column())
    }

    fn switch_database(&mut self, name: &str) {
        self.database = Some(name.to_string());
    }

    fn query(&mut self, statement: &str) -> Result<QueryResult, ClientError> {
        self.execute(statement)
    }
}

#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    series: Vec<Series>,
    #[serde(default)]
    error: Option<String>,
}

/// Maps an HTTP status to a client error, using the server's `error` field
/// when the body carries one.
fn check_status(status: u16, body: &str, username: &str) -> Result<(), ClientError> {
    if (200..300).contains(&status) {
        return Ok(());
    }

    let message = serde_json::from_str::<ResponseEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        401 | 403 => Err(ClientError::Authentication(format!(
            "user '{username}': {message}"
        ))),
        _ => Err(ClientError::Query(message)),
    }
}

/// Decodes a `/query` response body, merging the series of every statement.
fn decode_response(body: &str) -> Result<QueryResult, ClientError> {
    let envelope: ResponseEnvelope =
        serde_json::from_str(body).map_err(|e| ClientError::Decode(e.to_string()))?;

    if let Some(error) = envelope.error {
        return Err(ClientError::Query(error));
    }

    let mut series = Vec::new();
    for result in envelope.results {
        if let Some(error) = result.error {
            return Err(ClientError::Query(error));
        }
        series.extend(result.series);
    }

    Ok(QueryResult::new(series))
}
