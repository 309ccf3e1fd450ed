//! Rendering of command results as text or JSON.

use anyhow::Result;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use shared::config::NormalizeOptions;
use shared::date;
use shared::models::StalenessReport;
use shared::staleness::{DatabaseFailure, Enumeration, SkippedMeasurement};
use std::fmt::Write as _;

use crate::Format;

/// How staleness reports are rendered.
pub struct View<'a> {
    format: Format,
    normalize: &'a NormalizeOptions,
    stale_after: Option<f64>,
}

impl<'a> View<'a> {
    pub fn new(format: Format, normalize: &'a NormalizeOptions, stale_after: Option<f64>) -> Self {
        Self {
            format,
            normalize,
            stale_after,
        }
    }
}

#[derive(Serialize)]
struct ErrorEntry<'a> {
    database: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    measurement: Option<&'a str>,
    error: String,
}

impl<'a> From<&'a SkippedMeasurement> for ErrorEntry<'a> {
    fn from(skipped: &'a SkippedMeasurement) -> Self {
        Self {
            database: &skipped.target.database,
            measurement: Some(&skipped.target.measurement),
            error: skipped.error.to_string(),
        }
    }
}

impl<'a> From<&'a DatabaseFailure> for ErrorEntry<'a> {
    fn from(failure: &'a DatabaseFailure) -> Self {
        Self {
            database: &failure.database,
            measurement: None,
            error: failure.error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct CheckOutput<'a> {
    reports: &'a [StalenessReport],
    skipped: Vec<ErrorEntry<'a>>,
    failed_databases: Vec<ErrorEntry<'a>>,
}

/// Renders a database list, one name per line.
pub fn render_databases(databases: &[String], format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(databases)? + "\n"),
        Format::Text => Ok(databases.iter().map(|db| format!("{db}\n")).collect()),
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(
            header
                .iter()
                .map(|title| Cell::new(title).add_attribute(Attribute::Bold)),
        );
    table
}

/// Renders the measurement catalog grouped by database.
pub fn render_enumeration(enumeration: &Enumeration, format: Format) -> Result<String> {
    if format == Format::Json {
        let output = serde_json::json!({
            "databases": enumeration.catalog,
            "failed_databases": enumeration
                .failures
                .iter()
                .map(ErrorEntry::from)
                .collect::<Vec<_>>(),
        });
        return Ok(serde_json::to_string_pretty(&output)? + "\n");
    }

    let mut table = new_table(&["Database", "Measurement"]);
    for entry in enumeration.catalog.iter() {
        for (i, measurement) in entry.measurements.iter().enumerate() {
            table.add_row(vec![
                Cell::new(if i == 0 { entry.database.as_str() } else { "" }),
                Cell::new(measurement),
            ]);
        }
    }

    let mut out = format!("{table}\n");
    for failure in &enumeration.failures {
        writeln!(out, "{} skipped: {}", failure.database, failure.error)?;
    }
    Ok(out)
}

/// Renders staleness reports followed by whatever could not be checked.
pub fn render_reports(
    reports: &[StalenessReport],
    skipped: &[SkippedMeasurement],
    failures: &[DatabaseFailure],
    view: &View<'_>,
) -> Result<String> {
    if view.format == Format::Json {
        let output = CheckOutput {
            reports,
            skipped: skipped.iter().map(ErrorEntry::from).collect(),
            failed_databases: failures.iter().map(ErrorEntry::from).collect(),
        };
        return Ok(serde_json::to_string_pretty(&output)? + "\n");
    }

    let mut header = vec!["Database", "Measurement", "Result", "Last Point", "Minutes"];
    if view.stale_after.is_some() {
        header.push("Stale");
    }
    let mut table = new_table(&header);

    for report in reports {
        let last = report.last_timestamp().map_or_else(
            || "-".to_string(),
            |raw| date::normalize(raw, view.normalize).unwrap_or_else(|_| raw.to_string()),
        );
        let minutes = report
            .minutes_since_last()
            .map_or_else(|| "-".to_string(), |m| format!("{m:.2}"));

        let mut row = vec![
            Cell::new(report.database()),
            Cell::new(report.measurement()),
            Cell::new(report.result_code()),
            Cell::new(last),
            Cell::new(minutes).set_alignment(CellAlignment::Right),
        ];
        if let Some(threshold) = view.stale_after {
            let marker = if report.is_stale(threshold) { "STALE" } else { "" };
            row.push(Cell::new(marker));
        }
        table.add_row(row);
    }

    let mut out = format!("{table}\n");
    for entry in skipped {
        writeln!(out, "{} skipped: {}", entry.target, entry.error)?;
    }
    for failure in failures {
        writeln!(out, "{} skipped: {}", failure.database, failure.error)?;
    }

    Ok(out)
}
