//! bpstats Status Tool
//!
//! Runtime status of the service plus the usage guide served to clients.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants
pub const USAGE_INSTRUCTIONS: &str = r#"
# bpstats Usage Instructions

bpstats stores blood-pressure readings, classifies them and writes reports.

## Importing

**Tool:** `import_measurements`
- `file_path`: CSV export of blutdruckdaten.de
- `encoding` (optional): character set label, default is Latin-1 (`windows-1252`)

Lines that are not records (headers, comments, damaged rows) are skipped.
Rows with an `x` in the ignore column are stored but never counted.
Importing the same file twice replaces the readings instead of duplicating them.

## Single readings

**Tool:** `add_measurement`
- `timestamp`: `YYYY-MM-DD HH:MM` in the configured time zone, or RFC 3339
- `systolic`, `diastolic`: values in `unit` (`mmHg` default, `kPa` accepted)

## Statistics

- `summarize_period`: daily values, average, end-weighted average, median and
  the distribution over the seven categories for a date range
- `compare_quarters`: the same for the current quarter and the ones before it

All statistics run over one value per day: readings of the same day are
averaged first. The distribution counts every single reading.

## Reports

**Tool:** `generate_report`
- `style`: `simple` (text or pdf), `standard` (pdf, with chart), `compare` (text or pdf)
- `format`: `text` or `pdf`
- `start_date`/`end_date` (optional): default is the last 30 days
- Set the patient first with `set_patient_info` so reports carry a header.

## Categories

| Category | Systolic | Diastolic |
|----------|----------|-----------|
| Low | < 105 | < 65 |
| Optimal | 105-119 | 65-79 |
| Normal | 120-129 | 80-84 |
| High-Normal | 130-139 | 85-89 |
| Hypertension Level 1 | 140-159 | 90-99 |
| Hypertension Level 2 | 160-179 | 100-109 |
| Hypertension Level 3 | >= 180 | >= 110 |

The assessment of a pair is the more severe of its two categories.
"#;

/// Status information returned by the bpstats_status tool
#[derive(Debug, Clone, Serialize)]
pub struct BpstatsStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub measurement_count: Option<i64>,

    /// Configuration in effect
    pub time_zone: String,
    pub import_encoding: String,
    pub import_origin: String,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Settings echoed in the status
#[derive(Debug, Clone)]
pub struct StatusConfig {
    pub time_zone: String,
    pub import_encoding: String,
    pub import_origin: String,
}

/// Tracks the service start time and reports runtime status
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    config: StatusConfig,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, config: StatusConfig) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            config,
        }
    }

    /// Current status; `measurement_count` is passed in by the caller holding the pool
    pub fn get_status(&self, measurement_count: Option<i64>) -> BpstatsStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        BpstatsStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            measurement_count,
            time_zone: self.config.time_zone.clone(),
            import_encoding: self.config.import_encoding.clone(),
            import_origin: self.config.import_origin.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
