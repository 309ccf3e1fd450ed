//! Fluxwatch Shared Library
//!
//! This crate reports how long ago each measurement of an InfluxDB server last
//! received data.
//!
//! # Modules
//!
//! - [`client`] - Time-series client trait, InfluxDB HTTP and in-memory clients
//! - [`config`] - Connection and check configuration
//! - [`date`] - Timestamp normalization
//! - [`models`] - Measurement references, catalogs and staleness reports
//! - [`query`] - InfluxQL statements
//! - [`staleness`] - Enumeration, per-measurement checks and batch runs
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use shared::client::InMemoryClient;
//! use shared::models::MeasurementRef;
//! use shared::staleness::StalenessReporter;
//!
//! let client =
//!     InMemoryClient::new().with_point("telegraf", "cpu", Utc::now() - Duration::minutes(5));
//! let mut reporter = StalenessReporter::new(client);
//!
//! let report = reporter.check(&MeasurementRef::new("telegraf", "cpu"), 60).unwrap();
//! assert!(report.minutes_since_last().unwrap() >= 4.9);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod date;
pub mod models;
pub mod query;
pub mod staleness;

/// Re-export common dependencies for convenience.
pub use chrono;
pub use serde;
pub use serde_json;
