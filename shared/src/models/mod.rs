//! Data models for measurements and staleness reports.

mod measurement;
mod report;

pub use measurement::{DatabaseMeasurements, MeasurementCatalog, MeasurementRef};
pub use report::{ResultCode, StalenessReport};
