//! Report generation tools
//!
//! Write a text or PDF report for a date range or the latest quarters.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::parse_date;
use crate::db::Database;
use crate::engine::PressureDiagnosis;
use crate::models::PatientInfo;
use crate::report::{ReportContext, ReportFormat, ReportRegistry, ReportStyle};
use crate::zone::Zone;

/// Days covered when no start date is given
pub const DEFAULT_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub style: String,
    pub format: String,
    pub total_readings: usize,
    pub days_analyzed: usize,
    pub periods: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReportStyleInfo {
    pub style: String,
    pub formats: Vec<String>,
}

/// Styles and the formats each one can be written as
pub fn list_report_styles(registry: &ReportRegistry) -> Vec<ReportStyleInfo> {
    registry
        .catalogue()
        .into_iter()
        .map(|(style, formats)| ReportStyleInfo {
            style: style.to_string(),
            formats: formats.iter().map(|f| f.to_string()).collect(),
        })
        .collect()
}

/// Resolve the optional range: `end` defaults to `created`, `start` to
/// the `DEFAULT_PERIOD_DAYS` days ending at `end`
fn resolve_range(start: Option<&str>, end: Option<&str>, created: NaiveDate) -> Result<(NaiveDate, NaiveDate), String> {
    let end = match end {
        Some(end) => parse_date(end)?,
        None => created,
    };
    let start = match start {
        Some(start) => parse_date(start)?,
        None => end - Duration::days(DEFAULT_PERIOD_DAYS - 1),
    };
    if start > end {
        return Err(format!("Start date {} is after end date {}", start, end));
    }
    Ok((start, end))
}

/// Render `style` as `format` into `output_path`.
///
/// `start`/`end` select the period of the simple and standard styles; the
/// compare style always covers the quarter of `created` and the one before.
#[allow(clippy::too_many_arguments)]
pub fn generate_report(
    db: &Database,
    registry: &ReportRegistry,
    diagnosis: &PressureDiagnosis,
    zone: &Zone,
    style: &str,
    format: &str,
    output_path: &str,
    start: Option<&str>,
    end: Option<&str>,
    created: Option<&str>,
) -> Result<GenerateReportResponse, String> {
    let style = ReportStyle::from_str(style).ok_or_else(|| format!("Unknown report style '{}'", style))?;
    let format = ReportFormat::from_str(format).ok_or_else(|| format!("Unknown report format '{}'", format))?;
    if !registry.supports(style, format) {
        return Err(format!("Report style '{}' cannot be written as {}", style, format));
    }

    let created = match created {
        Some(date) => parse_date(date)?,
        None => zone.today(),
    };
    let (start, end) = resolve_range(start, end, created)?;

    let patient = db.with_conn(PatientInfo::get).map_err(|e| e.to_string())?;

    let ctx = ReportContext {
        db,
        diagnosis,
        zone: *zone,
        patient,
        created,
        start,
        end,
    };

    let outcome = registry
        .generate(style, format, &ctx, Path::new(output_path))
        .map_err(|e| e.to_string())?;

    Ok(GenerateReportResponse {
        success: true,
        file_path: outcome.path.display().to_string(),
        style: style.to_string(),
        format: format.to_string(),
        total_readings: outcome.measurement_count,
        days_analyzed: outcome.day_count,
        message: format!(
            "{} report written with {} readings over {} days",
            style, outcome.measurement_count, outcome.day_count
        ),
        periods: outcome.periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::measurements::add_measurement;

    fn setup() -> (tempfile::TempDir, Database, PressureDiagnosis) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("reports.db")).unwrap();
        let diagnosis = PressureDiagnosis::standard().unwrap();
        for (day, s, d) in [(1, 128.0, 84.0), (2, 135.0, 88.0), (3, 122.0, 79.0)] {
            let timestamp = format!("2022-03-{:02} 07:30", day);
            add_measurement(&db, &diagnosis, &Zone::Utc, &timestamp, s, d, None, false).unwrap();
        }
        (dir, db, diagnosis)
    }

    #[test]
    fn test_resolve_range() {
        let created = NaiveDate::from_ymd_opt(2022, 3, 31).unwrap();
        let (start, end) = resolve_range(None, None, created).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2022, 3, 2).unwrap());
        assert_eq!(end, created);
        assert!(resolve_range(Some("2022-04-01"), Some("2022-03-01"), created).is_err());
    }

    #[test]
    fn test_simple_text_report() {
        let (dir, db, diagnosis) = setup();
        let registry = ReportRegistry::with_defaults();
        let output = dir.path().join("out").join("report.txt");

        let response = generate_report(
            &db,
            &registry,
            &diagnosis,
            &Zone::Utc,
            "simple",
            "text",
            output.to_str().unwrap(),
            Some("2022-03-01"),
            Some("2022-03-31"),
            Some("2022-04-01"),
        )
        .unwrap();
        assert_eq!(response.total_readings, 3);
        assert_eq!(response.days_analyzed, 3);

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("Created:              2022-04-01"));
    }

    #[test]
    fn test_unsupported_and_empty() {
        let (dir, db, diagnosis) = setup();
        let registry = ReportRegistry::with_defaults();
        let output = dir.path().join("report.txt");
        let path = output.to_str().unwrap();

        let err = generate_report(&db, &registry, &diagnosis, &Zone::Utc, "standard", "text", path, None, None, None)
            .unwrap_err();
        assert!(err.contains("cannot be written"));

        let err = generate_report(
            &db,
            &registry,
            &diagnosis,
            &Zone::Utc,
            "simple",
            "text",
            path,
            Some("2021-01-01"),
            Some("2021-01-31"),
            None,
        )
        .unwrap_err();
        assert!(err.contains("No usable measurements"));
        assert!(!output.exists());
    }

    #[test]
    fn test_compare_pdf_report() {
        let (dir, db, diagnosis) = setup();
        let registry = ReportRegistry::with_defaults();
        let output = dir.path().join("compare.pdf");

        let response = generate_report(
            &db,
            &registry,
            &diagnosis,
            &Zone::Utc,
            "compare",
            "pdf",
            output.to_str().unwrap(),
            None,
            None,
            Some("2022-05-10"),
        )
        .unwrap();
        assert_eq!(response.periods, vec!["2022-Q1".to_string()]);
        assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
    }
}
