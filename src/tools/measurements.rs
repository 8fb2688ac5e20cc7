//! Measurement Tools
//!
//! Import, record, list and summarise blood-pressure readings.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use encoding_rs::Encoding;
use serde::Serialize;
use tracing::info;

use super::{parse_date, parse_timestamp};
use crate::db::Database;
use crate::engine::{quarter_bounds, PeriodBounds, PressureDiagnosis};
use crate::import::{encoding_for_label, ImporterKey, ImporterRegistry};
use crate::models::{Measurement, Pressure, PressureUnit, MMHG_RANGE};
use crate::report::PeriodReport;
use crate::zone::Zone;

/// One reading as shown to the client
#[derive(Debug, Serialize)]
pub struct MeasurementSummary {
    pub timestamp: String,
    pub systolic: i32,
    pub diastolic: i32,
    pub pulse_pressure: i32,
    pub ignored: bool,
    pub assessment: String,
}

impl MeasurementSummary {
    fn new(measurement: &Measurement, diagnosis: &PressureDiagnosis) -> Self {
        let sample = measurement.sample();
        Self {
            timestamp: measurement.timestamp.to_rfc3339(),
            systolic: sample.systolic(),
            diastolic: sample.diastolic(),
            pulse_pressure: sample.pulse_pressure(),
            ignored: measurement.ignored,
            assessment: diagnosis.assess(&sample).display_name().to_string(),
        }
    }
}

/// Most quarters compare_quarters reports in one call
pub const MAX_QUARTERS: u32 = 40;

/// Response for import_measurements
#[derive(Debug, Serialize)]
pub struct ImportMeasurementsResponse {
    pub success: bool,
    pub file_path: String,
    pub format: String,
    pub origin: String,
    pub encoding: String,
    pub parsed: usize,
    pub ignored: usize,
    pub stored: usize,
    pub first: Option<String>,
    pub last: Option<String>,
    pub total_in_database: i64,
    pub message: String,
}

/// Response for list_measurements
#[derive(Debug, Serialize)]
pub struct ListMeasurementsResponse {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub measurements: Vec<MeasurementSummary>,
    pub total: usize,
    pub ignored: usize,
}

/// One quarter of compare_quarters; `report` is absent for a quarter without data
#[derive(Debug, Serialize)]
pub struct QuarterSummary {
    pub bounds: PeriodBounds,
    pub report: Option<PeriodReport>,
}

/// Response for compare_quarters, oldest quarter first
#[derive(Debug, Serialize)]
pub struct CompareQuartersResponse {
    pub reference: NaiveDate,
    pub quarters: Vec<QuarterSummary>,
}

/// Response for dump_measurements
#[derive(Debug, Serialize)]
pub struct DumpMeasurementsResponse {
    pub success: bool,
    pub file_path: String,
    pub rows: usize,
}

/// Read a file with the importer under `key` and store every record.
/// `encoding` is a WHATWG label; `None` uses `default_encoding`.
pub fn import_measurements(
    db: &Database,
    registry: &ImporterRegistry,
    key: &ImporterKey,
    zone: &Zone,
    file_path: &str,
    encoding: Option<&str>,
    default_encoding: &'static Encoding,
) -> Result<ImportMeasurementsResponse, String> {
    let encoding = match encoding {
        Some(label) => encoding_for_label(label).map_err(|e| e.to_string())?,
        None => default_encoding,
    };

    let measurements = registry
        .import(key, Path::new(file_path), zone, Some(encoding))
        .map_err(|e| e.to_string())?;

    let stored = db
        .with_conn_mut(|conn| Measurement::store_all(conn, &measurements))
        .map_err(|e| e.to_string())?;
    let total_in_database = db.with_conn(Measurement::count).map_err(|e| e.to_string())?;

    let ignored = measurements.iter().filter(|m| m.ignored).count();
    let first = measurements.iter().map(|m| m.timestamp).min();
    let last = measurements.iter().map(|m| m.timestamp).max();

    info!(file = file_path, stored, ignored, "Import finished");

    Ok(ImportMeasurementsResponse {
        success: true,
        file_path: file_path.to_string(),
        format: key.format.to_string(),
        origin: key.origin.clone(),
        encoding: encoding.name().to_string(),
        parsed: measurements.len(),
        ignored,
        stored,
        first: first.map(|t| t.to_rfc3339()),
        last: last.map(|t| t.to_rfc3339()),
        total_in_database,
        message: format!("Stored {} measurements ({} marked as ignored)", stored, ignored),
    })
}

/// Record a single reading; replaces one already stored for the same instant
#[allow(clippy::too_many_arguments)]
pub fn add_measurement(
    db: &Database,
    diagnosis: &PressureDiagnosis,
    zone: &Zone,
    timestamp: &str,
    systolic: f64,
    diastolic: f64,
    unit: Option<&str>,
    ignored: bool,
) -> Result<MeasurementSummary, String> {
    let unit = match unit {
        Some(u) => PressureUnit::from_str(u).ok_or_else(|| format!("Unknown pressure unit '{}'", u))?,
        None => PressureUnit::MillimetreOfMercury,
    };
    let timestamp = parse_timestamp(timestamp, zone)?;
    let pressure = |name: &str, value| {
        let pressure = Pressure { value, unit };
        match pressure.checked_mmhg() {
            Some(_) => Ok(pressure),
            None => Err(format!(
                "{} pressure {} is outside {}..={} mmHg",
                name,
                pressure,
                MMHG_RANGE.start(),
                MMHG_RANGE.end()
            )),
        }
    };
    let systolic = pressure("Systolic", systolic)?;
    let diastolic = pressure("Diastolic", diastolic)?;

    let measurement = Measurement::new(timestamp, systolic, diastolic, ignored);
    db.with_conn(|conn| Measurement::store(conn, &measurement))
        .map_err(|e| e.to_string())?;

    Ok(MeasurementSummary::new(&measurement, diagnosis))
}

/// Readings whose local date lies in `start..=end`
pub fn list_measurements(
    db: &Database,
    diagnosis: &PressureDiagnosis,
    zone: &Zone,
    start: &str,
    end: &str,
    include_ignored: bool,
) -> Result<ListMeasurementsResponse, String> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;

    let rows = db
        .with_conn(|conn| Measurement::list_by_date_range(conn, start, end, zone))
        .map_err(|e| e.to_string())?;
    let ignored = rows.iter().filter(|m| m.ignored).count();

    let measurements: Vec<MeasurementSummary> = rows
        .iter()
        .filter(|m| include_ignored || !m.ignored)
        .map(|m| MeasurementSummary::new(m, diagnosis))
        .collect();

    Ok(ListMeasurementsResponse {
        start,
        end,
        total: measurements.len(),
        measurements,
        ignored,
    })
}

/// Daily values, the three estimators and the distribution for `start..=end`
pub fn summarize_period(
    db: &Database,
    diagnosis: &PressureDiagnosis,
    zone: &Zone,
    start: &str,
    end: &str,
) -> Result<PeriodReport, String> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;

    db.with_conn(|conn| PeriodReport::load(conn, diagnosis, zone, start, end, None))
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("No usable measurements between {} and {}", start, end))
}

/// The quarter containing `reference` (today when `None`) and the
/// `quarters - 1` quarters before it
pub fn compare_quarters(
    db: &Database,
    diagnosis: &PressureDiagnosis,
    zone: &Zone,
    reference: Option<&str>,
    quarters: u32,
) -> Result<CompareQuartersResponse, String> {
    let reference = match reference {
        Some(date) => parse_date(date)?,
        None => zone.today(),
    };
    if !(1..=MAX_QUARTERS).contains(&quarters) {
        return Err(format!("Quarters must be between 1 and {}, got {}", MAX_QUARTERS, quarters));
    }

    let conn = db.get_conn().map_err(|e| e.to_string())?;
    let mut summaries = Vec::new();
    for back in (0..quarters).rev() {
        let bounds = quarter_bounds(reference, back);
        let report = PeriodReport::load(&conn, diagnosis, zone, bounds.start, bounds.end, Some(bounds.label.clone()))
            .map_err(|e| e.to_string())?;
        summaries.push(QuarterSummary { bounds, report });
    }

    Ok(CompareQuartersResponse {
        reference,
        quarters: summaries,
    })
}

fn upsert_statement(measurement: &Measurement) -> String {
    format!(
        "INSERT INTO measurements (measured_at, utc_offset, systolic, diastolic, ignored) \
         VALUES ('{}', {}, {}, {}, {}) \
         ON CONFLICT(measured_at) DO UPDATE SET utc_offset = excluded.utc_offset, \
         systolic = excluded.systolic, diastolic = excluded.diastolic, ignored = excluded.ignored;",
        measurement.storage_key(),
        measurement.timestamp.offset().local_minus_utc(),
        measurement.systolic_mmhg(),
        measurement.diastolic_mmhg(),
        i32::from(measurement.ignored),
    )
}

/// SQL script that restores every stored reading, one upsert per row
pub fn dump_script(measurements: &[Measurement], generated: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("-- bpstats measurement dump, {} rows", measurements.len()),
        format!("-- generated {}", generated.to_rfc3339()),
        "BEGIN TRANSACTION;".to_string(),
    ];
    lines.extend(measurements.iter().map(upsert_statement));
    lines.push("COMMIT;".to_string());
    lines.push(String::new());
    lines.join("\n")
}

/// Write `dump_script` of the whole table to `output_path`
pub fn dump_measurements(db: &Database, output_path: &str) -> Result<DumpMeasurementsResponse, String> {
    let measurements = db
        .with_conn(Measurement::list_recorded)
        .map_err(|e| e.to_string())?;

    let path = Path::new(output_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(path, dump_script(&measurements, Utc::now())).map_err(|e| e.to_string())?;

    info!(file = output_path, rows = measurements.len(), "Measurements dumped");

    Ok(DumpMeasurementsResponse {
        success: true,
        file_path: output_path.to_string(),
        rows: measurements.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{default_encoding, InputFormat, DEFAULT_ORIGIN};
    use std::io::Write;

    fn setup() -> (tempfile::TempDir, Database, PressureDiagnosis) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();
        (dir, db, PressureDiagnosis::standard().unwrap())
    }

    #[test]
    fn test_import_and_list() {
        let (dir, db, diagnosis) = setup();
        let path = dir.path().join("export.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#""Datum","Uhrzeit","Systole","Diastole","Puls""#).unwrap();
        writeln!(file, r#""13.03.2022","07:10","130","85","70","","","","","","","","""#).unwrap();
        writeln!(file, r#""13.03.2022","19:30","150","95","72","","","","","","","x","""#).unwrap();
        writeln!(file, r#""14.03.2022","07:05","120","80","66","","","","","","","","""#).unwrap();
        drop(file);

        let registry = ImporterRegistry::with_defaults();
        let key = ImporterKey::new(InputFormat::Csv, DEFAULT_ORIGIN);
        let response = import_measurements(
            &db,
            &registry,
            &key,
            &Zone::Utc,
            path.to_str().unwrap(),
            None,
            default_encoding(),
        )
        .unwrap();
        assert_eq!(response.parsed, 3);
        assert_eq!(response.ignored, 1);
        assert_eq!(response.total_in_database, 3);

        let listed = list_measurements(&db, &diagnosis, &Zone::Utc, "2022-03-13", "2022-03-13", false).unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.ignored, 1);
        assert_eq!(listed.measurements[0].pulse_pressure, 45);

        // importing the same file again replaces rows instead of adding
        import_measurements(&db, &registry, &key, &Zone::Utc, path.to_str().unwrap(), None, default_encoding())
            .unwrap();
        assert_eq!(db.with_conn(Measurement::count).unwrap(), 3);
    }

    #[test]
    fn test_import_missing_file() {
        let (_dir, db, _) = setup();
        let registry = ImporterRegistry::with_defaults();
        let key = ImporterKey::new(InputFormat::Csv, DEFAULT_ORIGIN);
        let err = import_measurements(&db, &registry, &key, &Zone::Utc, "/no/such/file.csv", None, default_encoding())
            .unwrap_err();
        assert!(err.contains("missing"));
    }

    #[test]
    fn test_add_and_summarize() {
        let (_dir, db, diagnosis) = setup();
        let added = add_measurement(&db, &diagnosis, &Zone::Utc, "2022-03-01 08:00", 16.0, 10.7, Some("kPa"), false)
            .unwrap();
        assert_eq!(added.systolic, 120);
        assert_eq!(added.diastolic, 80);

        add_measurement(&db, &diagnosis, &Zone::Utc, "2022-03-02 08:00", 140.0, 90.0, None, false).unwrap();
        let summary = summarize_period(&db, &diagnosis, &Zone::Utc, "2022-03-01", "2022-03-31").unwrap();
        assert_eq!(summary.day_count, 2);
        assert_eq!(summary.summary.average.systolic(), 130);

        assert!(summarize_period(&db, &diagnosis, &Zone::Utc, "2023-01-01", "2023-01-31").is_err());
    }

    #[test]
    fn test_add_rejects_out_of_range_pressure() {
        let (_dir, db, diagnosis) = setup();
        for (s, d) in [(1e12, -1e12), (-120.0, 80.0), (f64::NAN, -5.0), (120.0, f64::INFINITY), (1000.0, 80.0)] {
            let err = add_measurement(&db, &diagnosis, &Zone::Utc, "2022-03-01 08:00", s, d, None, false).unwrap_err();
            assert!(err.contains("outside 1..=999 mmHg"), "{}", err);
        }
        assert_eq!(db.with_conn(Measurement::count).unwrap(), 0);

        let listed = list_measurements(&db, &diagnosis, &Zone::Utc, "2022-03-01", "2022-03-31", true).unwrap();
        assert_eq!(listed.total, 0);
    }

    #[test]
    fn test_compare_quarters_limit() {
        let (_dir, db, diagnosis) = setup();
        for quarters in [0, MAX_QUARTERS + 1, u32::MAX] {
            let err = compare_quarters(&db, &diagnosis, &Zone::Utc, Some("2022-04-15"), quarters).unwrap_err();
            assert!(err.contains("between 1 and 40"), "{}", err);
        }
        let response = compare_quarters(&db, &diagnosis, &Zone::Utc, Some("2022-04-15"), MAX_QUARTERS).unwrap();
        assert_eq!(response.quarters.len(), MAX_QUARTERS as usize);
        assert_eq!(response.quarters[0].bounds.label, "2012-Q3");
    }

    #[test]
    fn test_compare_quarters() {
        let (_dir, db, diagnosis) = setup();
        add_measurement(&db, &diagnosis, &Zone::Utc, "2022-02-10 08:00", 130.0, 85.0, None, false).unwrap();

        let response = compare_quarters(&db, &diagnosis, &Zone::Utc, Some("2022-04-15"), 2).unwrap();
        assert_eq!(response.quarters.len(), 2);
        assert_eq!(response.quarters[0].bounds.label, "2022-Q1");
        assert!(response.quarters[0].report.is_some());
        assert_eq!(response.quarters[1].bounds.label, "2022-Q2");
        assert!(response.quarters[1].report.is_none());
    }

    #[test]
    fn test_dump_script() {
        let (dir, db, diagnosis) = setup();
        add_measurement(&db, &diagnosis, &Zone::Utc, "2022-03-13T16:57:00+01:00", 120.0, 80.0, None, true).unwrap();

        let path = dir.path().join("dump").join("measurements.sql");
        let response = dump_measurements(&db, path.to_str().unwrap()).unwrap();
        assert_eq!(response.rows, 1);

        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.contains("'2022-03-13T15:57:00Z', 3600, 120, 80, 1"));
        assert!(script.trim_end().ends_with("COMMIT;"));
    }
}
