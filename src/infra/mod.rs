//! Runtime bootstrap: telemetry and process-level failures.

pub mod error;
pub mod telemetry;
