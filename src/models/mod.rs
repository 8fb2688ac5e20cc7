//! Data models
//!
//! Readings and the patient, with their SQLite persistence.

mod measurement;
mod patient;

pub use measurement::{Measurement, Pressure, PressureUnit, MMHG_RANGE};
pub use patient::PatientInfo;
