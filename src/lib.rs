//! Blood Pressure Statistics (bpstats) Library
//!
//! Import, classification and reporting of self-measured blood pressure.

pub mod build_info;
pub mod config;
pub mod db;
pub mod engine;
pub mod import;
pub mod mcp;
pub mod models;
pub mod report;
pub mod tools;
pub mod zone;
