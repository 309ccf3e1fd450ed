//! Integration tests for the staleness reporter.
//!
//! These tests drive the public API end to end, first against the in-memory
//! client and then against a mock HTTP server answering InfluxDB `/query`
//! requests.

mod common;

use chrono::Duration;
use common::{empty_envelope, envelope, fixed_now};
use shared::client::{ClientError, InMemoryClient, InfluxClient, TimeSeriesClient};
use shared::models::{MeasurementRef, ResultCode};
use shared::staleness::{ReportError, StalenessReporter};

fn exclude_internal() -> Vec<String> {
    vec!["_internal".to_string()]
}

/// A server with a monitoring database, two application databases (one with
/// a broken measurement) and an empty scratch database.
fn populated_client() -> InMemoryClient {
    let now = fixed_now();
    InMemoryClient::new()
        .with_point("_internal", "runtime", now - Duration::minutes(1))
        .with_point("telegraf", "cpu", now - Duration::minutes(5))
        .with_point("telegraf", "mem", now - Duration::minutes(90))
        .with_point("app", "requests", now - Duration::minutes(2))
        .with_failing_measurement("app", "broken")
        .with_database("scratch")
}

mod enumeration {
    use super::*;

    #[test]
    fn test_enumerate_excludes_internal_and_reports_empty_database() {
        let mut reporter = StalenessReporter::new(populated_client());

        let enumeration = reporter.enumerate(&exclude_internal()).unwrap();

        assert_eq!(
            enumeration.catalog.databases().collect::<Vec<_>>(),
            vec!["telegraf", "app"]
        );
        assert_eq!(enumeration.failures.len(), 1);
        assert_eq!(enumeration.failures[0].database, "scratch");
        assert!(matches!(
            enumeration.failures[0].error,
            ReportError::EmptyMeasurement { .. }
        ));
    }

    #[test]
    fn test_excluded_database_is_never_queried() {
        let mut reporter = StalenessReporter::new(populated_client());

        reporter.enumerate(&exclude_internal()).unwrap();

        assert!(reporter
            .client()
            .executed()
            .iter()
            .all(|entry| !entry.starts_with("_internal>")));
    }

    #[test]
    fn test_enumerate_fails_on_authentication_outage() {
        let client = populated_client()
            .with_outage(ClientError::Authentication("authorization failed".to_string()));
        let mut reporter = StalenessReporter::new(client);

        let err = reporter.enumerate(&exclude_internal()).unwrap_err();
        assert!(err.is_transport());
        assert_eq!(
            err.to_string(),
            "Authentication failed: authorization failed"
        );
    }
}

mod staleness {
    use super::*;
    use shared::config::NormalizeOptions;

    #[test]
    fn test_enumerate_then_run() {
        let mut reporter = StalenessReporter::new(populated_client());

        let enumeration = reporter.enumerate(&exclude_internal()).unwrap();
        let batch = reporter.run_at(&enumeration.catalog, 60, fixed_now());

        let summary: Vec<(String, ResultCode)> = batch
            .reports
            .iter()
            .map(|r| (r.target().to_string(), r.result_code()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("telegraf/cpu".to_string(), ResultCode::Found),
                ("telegraf/mem".to_string(), ResultCode::NotFound),
                ("app/requests".to_string(), ResultCode::Found),
            ]
        );

        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].target, MeasurementRef::new("app", "broken"));
    }

    #[test]
    fn test_batch_report_serializes_result_codes() {
        let mut reporter = StalenessReporter::new(populated_client());

        let enumeration = reporter.enumerate(&exclude_internal()).unwrap();
        let batch = reporter.run_at(&enumeration.catalog, 60, fixed_now());
        let json = serde_json::to_value(&batch.reports).unwrap();

        assert_eq!(json[0]["database"], "telegraf");
        assert_eq!(json[0]["measurement"], "cpu");
        assert_eq!(json[0]["result_code"], 0);
        assert_eq!(json[0]["minutes_since_last"], 5.0);
        assert_eq!(json[1]["result_code"], 1);
        assert!(json[1].get("last_timestamp").is_none());
    }

    #[test]
    fn test_timezone_offset_applies_to_both_sides() {
        for offset in [-5, 0, 3] {
            let client = InMemoryClient::new().with_point(
                "telegraf",
                "cpu",
                fixed_now() - Duration::minutes(5),
            );
            let mut reporter = StalenessReporter::new(client)
                .with_normalize_options(NormalizeOptions::default().with_timezone_offset(offset));

            let report = reporter
                .check_at(&MeasurementRef::new("telegraf", "cpu"), 60, fixed_now())
                .unwrap();

            assert_eq!(report.minutes_since_last(), Some(5.0), "offset {offset}");
        }
    }

    #[test]
    fn test_stale_threshold_over_batch() {
        let mut reporter = StalenessReporter::new(populated_client());

        let enumeration = reporter.enumerate(&exclude_internal()).unwrap();
        let batch = reporter.run_at(&enumeration.catalog, 60, fixed_now());

        let stale: Vec<String> = batch.stale(3.0).map(|r| r.target().to_string()).collect();
        assert_eq!(stale, vec!["telegraf/cpu", "telegraf/mem"]);
    }
}

mod normalization {
    use shared::config::NormalizeOptions;
    use shared::date::{normalize, parse, DateError};

    #[test]
    fn test_both_representations_normalize_identically() {
        let options = NormalizeOptions::default();
        assert_eq!(
            normalize("2024-05-01T10:15:30.123456789Z", &options).unwrap(),
            normalize("2024-05-01 10:15:30.123456", &options).unwrap()
        );
    }

    #[test]
    fn test_opposite_offsets_cancel() {
        let forward = parse("2024-12-31T23:30:00Z", 1).unwrap();
        let back = parse(&forward.to_string(), -1).unwrap();
        assert_eq!(back, parse("2024-12-31T23:30:00Z", 0).unwrap());
    }

    #[test]
    fn test_surrounding_text_is_ignored() {
        let options = NormalizeOptions::default();
        assert_eq!(
            normalize("last write at 2024-05-01 10:15:30 UTC", &options).unwrap(),
            "2024-05-01 10:15:30"
        );
    }

    #[test]
    fn test_unrecognized_input() {
        assert!(matches!(
            parse("05/01/2024 10:15", 0),
            Err(DateError::UnrecognizedDateFormat { .. })
        ));
    }
}

mod influx_http {
    use super::*;
    use crate::common::{config_for, last_point_statement, statement};
    use mockito::Server;

    const DATABASES: &str =
        r#"{"name":"databases","columns":["name"],"values":[["_internal"],["telegraf"]]}"#;
    const MEASUREMENTS: &str =
        r#"{"name":"measurements","columns":["name"],"values":[["cpu"],["disk"]]}"#;

    fn last_point(time: &str) -> String {
        envelope(&format!(
            r#"{{"name":"cpu","tags":{{"host":"a"}},"columns":["time","usage"],"values":[["{time}",12.5]]}}"#
        ))
    }

    #[test]
    fn test_enumerate_and_run_over_http() {
        let mut server = Server::new();
        let cpu_time = (fixed_now() - Duration::minutes(5))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let databases = server
            .mock("GET", "/query")
            .match_query(statement("SHOW DATABASES", None))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(envelope(DATABASES))
            .expect(1)
            .create();
        let measurements = server
            .mock("GET", "/query")
            .match_query(statement("SHOW MEASUREMENTS", Some("telegraf")))
            .with_status(200)
            .with_body(envelope(MEASUREMENTS))
            .expect(1)
            .create();
        let cpu = server
            .mock("GET", "/query")
            .match_query(statement(&last_point_statement("cpu", 60), Some("telegraf")))
            .with_status(200)
            .with_body(last_point(&cpu_time))
            .create();
        let disk = server
            .mock("GET", "/query")
            .match_query(statement(&last_point_statement("disk", 60), Some("telegraf")))
            .with_status(200)
            .with_body(empty_envelope())
            .create();

        let mut reporter = StalenessReporter::new(InfluxClient::new(&config_for(&server)));
        let enumeration = reporter.enumerate(&exclude_internal()).unwrap();
        let batch = reporter.run_at(&enumeration.catalog, 60, fixed_now());

        assert!(batch.is_complete(), "skipped: {:?}", batch.skipped);
        assert_eq!(batch.reports.len(), 2);
        assert_eq!(batch.reports[0].measurement(), "cpu");
        assert_eq!(batch.reports[0].minutes_since_last(), Some(5.0));
        assert_eq!(batch.reports[1].measurement(), "disk");
        assert_eq!(batch.reports[1].result_code(), ResultCode::NotFound);

        databases.assert();
        measurements.assert();
        cpu.assert();
        disk.assert();
    }

    #[test]
    fn test_credentials_are_sent_as_basic_auth() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/query")
            .match_query(statement("SHOW DATABASES", None))
            .match_header("authorization", "Basic bW9uaXRvcjpwdw==")
            .with_status(200)
            .with_body(envelope(DATABASES))
            .create();

        let config = config_for(&server).with_credentials("monitor", "pw");
        let mut client = InfluxClient::new(&config);

        assert_eq!(client.list_databases().unwrap(), vec!["_internal", "telegraf"]);
        mock.assert();
    }

    #[test]
    fn test_unauthorized_maps_to_authentication_error() {
        let mut server = Server::new();
        let _mock = server
            .mock("GET", "/query")
            .match_query(statement("SHOW DATABASES", None))
            .with_status(401)
            .with_body(r#"{"error":"authorization failed"}"#)
            .create();

        let config = config_for(&server).with_credentials("monitor", "wrong");
        let mut reporter = StalenessReporter::new(InfluxClient::new(&config));
        let err = reporter.list_databases(&[]).unwrap_err();

        assert_eq!(
            err,
            ReportError::Authentication("user 'monitor': authorization failed".to_string())
        );
    }

    #[test]
    fn test_statement_error_skips_measurement() {
        let mut server = Server::new();
        let _measurements = server
            .mock("GET", "/query")
            .match_query(statement("SHOW MEASUREMENTS", Some("telegraf")))
            .with_status(200)
            .with_body(envelope(MEASUREMENTS))
            .create();
        let failure =
            r#"{"results":[{"statement_id":0,"error":"max-select-point limit exceeded"}]}"#;
        let _cpu = server
            .mock("GET", "/query")
            .match_query(statement(&last_point_statement("cpu", 60), Some("telegraf")))
            .with_status(200)
            .with_body(failure)
            .create();
        let _disk = server
            .mock("GET", "/query")
            .match_query(statement(&last_point_statement("disk", 60), Some("telegraf")))
            .with_status(200)
            .with_body(failure)
            .create();

        let mut reporter = StalenessReporter::new(InfluxClient::new(&config_for(&server)));
        let enumeration = reporter.list_measurements(&["telegraf".to_string()]);
        let batch = reporter.run_at(&enumeration.catalog, 60, fixed_now());

        assert!(batch.reports.is_empty());
        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(
            batch.skipped[0].error,
            ReportError::Query("max-select-point limit exceeded".to_string())
        );
    }

    #[test]
    fn test_unreachable_server_is_a_connection_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = shared::config::ConnectionConfig::new("127.0.0.1", port);

        let mut reporter = StalenessReporter::new(InfluxClient::new(&config));
        let err = reporter.enumerate(&[]).unwrap_err();

        assert!(matches!(err, ReportError::Connection(_)));
    }
}
