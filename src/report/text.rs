//! Plain text reports
//!
//! Fixed-width layout meant for a terminal or an e-mail body.

use std::fmt::{self, Write};

use chrono::NaiveDate;

use super::{PeriodReport, ReportContext, ReportError, DISCLAIMER};
use crate::engine::{PeriodBounds, PressureDiagnosis, PressureSample, Severity};
use crate::models::PatientInfo;

const RULE_WIDTH: usize = 78;

fn heading(out: &mut String, title: &str, patient: Option<&PatientInfo>, created: NaiveDate) -> fmt::Result {
    writeln!(out, "{}", title)?;
    if let Some(patient) = patient {
        writeln!(out, "{}", patient.header())?;
    }
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "{:<22}{}", "Created:", created)?;
    writeln!(out)
}

fn period_facts(out: &mut String, period: &PeriodReport) -> fmt::Result {
    writeln!(out, "{:<22}{}", "First day:", period.first_day)?;
    writeln!(out, "{:<22}{}", "Last day:", period.last_day)?;
    writeln!(out, "{:<22}{}", "Measurements:", period.measurement_count)?;
    if period.ignored_count > 0 {
        writeln!(out, "{:<22}{}", "Ignored:", period.ignored_count)?;
    }
    writeln!(out, "{:<22}{}", "Total days:", period.total_days)?;
    writeln!(out, "{:<22}{}", "Days with values:", period.day_count)
}

fn estimator_row(out: &mut String, caption: &str, sample: &PressureSample, severity: Severity) -> fmt::Result {
    writeln!(
        out,
        "{:<20}{:>9}{:>11}{:>10}   {}",
        caption,
        sample.systolic(),
        sample.diastolic(),
        sample.pulse_pressure(),
        severity.display_name()
    )
}

fn estimators(out: &mut String, period: &PeriodReport) -> fmt::Result {
    writeln!(out, "{:<20}{:>9}{:>11}{:>10}   {}", "", "Systolic", "Diastolic", "PP", "Assessment")?;
    estimator_row(out, "Average", &period.summary.average, period.assessment.average)?;
    estimator_row(
        out,
        "Weighted Average",
        &period.summary.weighted_average,
        period.assessment.weighted_average,
    )?;
    estimator_row(out, "Median", &period.summary.median, period.assessment.median)
}

fn distribution(out: &mut String, period: &PeriodReport, diagnosis: &PressureDiagnosis) -> fmt::Result {
    let systolic = diagnosis.systolic_table();
    let diastolic = diagnosis.diastolic_table();

    writeln!(out, "Distribution of {} measurements", period.distribution.total())?;
    writeln!(out, "{:<22}{:<27}{}", "", "Systolic", "Diastolic")?;
    for (severity, bucket) in period.distribution.rows() {
        writeln!(
            out,
            "{:<22}{:<12}{:>5} {:5.1}%   {:<12}{:>5} {:5.1}%",
            severity.display_name(),
            systolic.caption(severity),
            bucket.systolic_count,
            bucket.systolic_percent,
            diastolic.caption(severity),
            bucket.diastolic_count,
            bucket.diastolic_percent
        )?;
    }
    Ok(())
}

fn footer(out: &mut String) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "{}", DISCLAIMER)
}

/// Key figures of one period
pub fn period_text(
    patient: Option<&PatientInfo>,
    created: NaiveDate,
    diagnosis: &PressureDiagnosis,
    period: &PeriodReport,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    heading(&mut out, "Blood Pressure Report", patient, created)?;
    period_facts(&mut out, period)?;
    writeln!(out)?;
    estimators(&mut out, period)?;
    writeln!(out)?;
    distribution(&mut out, period, diagnosis)?;
    footer(&mut out)?;
    Ok(out)
}

/// Quarters side by side, oldest first. A quarter without data is listed
/// with a note instead of figures.
pub fn compare_text(
    patient: Option<&PatientInfo>,
    created: NaiveDate,
    diagnosis: &PressureDiagnosis,
    quarters: &[(&PeriodBounds, Option<&PeriodReport>)],
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    heading(&mut out, "Blood Pressure Quarter Comparison", patient, created)?;

    for (bounds, period) in quarters {
        writeln!(out, "== {} ({} to {}) ==", bounds.label, bounds.start, bounds.end)?;
        match period {
            Some(period) => {
                period_facts(&mut out, period)?;
                writeln!(out)?;
                estimators(&mut out, period)?;
                writeln!(out)?;
                distribution(&mut out, period, diagnosis)?;
            }
            None => writeln!(out, "No measurements.")?,
        }
        writeln!(out)?;
    }

    if let [(_, Some(previous)), (_, Some(current))] = quarters {
        writeln!(out, "Change of the average")?;
        let change = |now: i32, before: i32| format!("{:+}", now - before);
        let (a, b) = (&current.summary.average, &previous.summary.average);
        writeln!(
            out,
            "{:<20}{:>9}{:>11}{:>10}",
            "",
            change(a.systolic(), b.systolic()),
            change(a.diastolic(), b.diastolic()),
            change(a.pulse_pressure(), b.pulse_pressure())
        )?;
    }

    footer(&mut out)?;
    Ok(out)
}

pub(crate) fn render_period(ctx: &ReportContext<'_>, period: &PeriodReport) -> Result<String, ReportError> {
    Ok(period_text(ctx.patient.as_ref(), ctx.created, ctx.diagnosis, period)?)
}

pub(crate) fn render_compare(
    ctx: &ReportContext<'_>,
    quarters: &[(&PeriodBounds, Option<&PeriodReport>)],
) -> Result<String, ReportError> {
    Ok(compare_text(ctx.patient.as_ref(), ctx.created, ctx.diagnosis, quarters)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::quarter_bounds;
    use crate::models::{Measurement, Pressure};
    use crate::zone::Zone;

    fn period(values: &[(u32, f64, f64)]) -> PeriodReport {
        let rows: Vec<Measurement> = values
            .iter()
            .map(|(day, s, d)| {
                let naive = NaiveDate::from_ymd_opt(2022, 3, *day).unwrap().and_hms_opt(8, 0, 0).unwrap();
                Measurement::new(Zone::Utc.localize(naive), Pressure::mmhg(*s), Pressure::mmhg(*d), false)
            })
            .collect();
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let (start, end) = (NaiveDate::from_ymd_opt(2022, 3, 1).unwrap(), NaiveDate::from_ymd_opt(2022, 3, 31).unwrap());
        PeriodReport::assemble(&rows, &diagnosis, start, end, None).unwrap()
    }

    fn patient() -> PatientInfo {
        PatientInfo {
            name: "Erika Mustermann".to_string(),
            birthdate: NaiveDate::from_ymd_opt(1964, 8, 12).unwrap(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_period_text() {
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let report = period(&[(2, 120.0, 80.0), (3, 140.0, 90.0)]);
        let created = NaiveDate::from_ymd_opt(2022, 4, 1).unwrap();
        let text = period_text(Some(&patient()), created, &diagnosis, &report).unwrap();

        assert!(text.starts_with("Blood Pressure Report\nErika Mustermann (1964-08-12)\n"));
        assert!(text.contains("First day:            2022-03-02"));
        assert!(text.contains("Days with values:     2"));
        assert!(text.lines().any(|l| l.starts_with("Average") && l.contains("130") && l.contains("85")));
        assert!(text.contains("(< 105)"));
        assert!(text.contains(" 50.0%"));
        assert!(text.trim_end().ends_with(DISCLAIMER));
    }

    #[test]
    fn test_without_patient() {
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let report = period(&[(2, 120.0, 80.0)]);
        let text = period_text(None, NaiveDate::from_ymd_opt(2022, 4, 1).unwrap(), &diagnosis, &report).unwrap();
        let second = text.lines().nth(1).unwrap();
        assert!(second.starts_with("---"));
    }

    #[test]
    fn test_compare_text() {
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let created = NaiveDate::from_ymd_opt(2022, 4, 15).unwrap();
        let previous_bounds = quarter_bounds(created, 1);
        let current_bounds = quarter_bounds(created, 0);
        let previous = period(&[(2, 130.0, 85.0)]);

        let text = compare_text(
            None,
            created,
            &diagnosis,
            &[(&previous_bounds, Some(&previous)), (&current_bounds, None)],
        )
        .unwrap();
        assert!(text.contains("== 2022-Q1 (2022-01-01 to 2022-03-31) =="));
        assert!(text.contains("== 2022-Q2 (2022-04-01 to 2022-06-30) =="));
        assert!(text.contains("No measurements."));
        assert!(!text.contains("Change of the average"));
    }
}
