//! Period summary
//!
//! Everything a report shows for one date range, computed from the stored
//! measurements of that range.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::DbResult;
use crate::engine::{
    compress_to_days, summarize, DailyValues, Distribution, PressureDiagnosis, PressureSample, Summary,
    SummaryAssessment,
};
use crate::models::Measurement;
use crate::zone::Zone;

#[derive(Debug, Clone, Serialize)]
pub struct PeriodReport {
    /// Requested range, inclusive
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: Option<String>,

    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    /// Calendar days from first to last measured day
    pub total_days: i64,
    /// Days with at least one measurement
    pub day_count: usize,
    /// Measurements that count
    pub measurement_count: usize,
    pub ignored_count: usize,

    pub daily: DailyValues,
    pub summary: Summary,
    pub assessment: SummaryAssessment,
    pub distribution: Distribution,

    /// Every counted measurement, for charts
    #[serde(skip)]
    pub series: Vec<(DateTime<FixedOffset>, PressureSample)>,
}

impl PeriodReport {
    /// Run the pipeline over `measurements` (time ordered, ignored ones
    /// included). `None` when nothing in the slice counts.
    pub fn assemble(
        measurements: &[Measurement],
        diagnosis: &PressureDiagnosis,
        start: NaiveDate,
        end: NaiveDate,
        label: Option<String>,
    ) -> Option<Self> {
        let series: Vec<(DateTime<FixedOffset>, PressureSample)> = measurements
            .iter()
            .filter(|m| !m.ignored)
            .map(|m| (m.timestamp, m.sample()))
            .collect();
        let ignored_count = measurements.len() - series.len();

        let daily = compress_to_days(&series);
        let summary = summarize(&daily.samples())?;
        let first_day = daily.first_day()?;
        let last_day = daily.last_day()?;

        let samples: Vec<PressureSample> = series.iter().map(|(_, s)| *s).collect();
        let distribution = Distribution::distribute(diagnosis, &samples);

        Some(Self {
            start,
            end,
            label,
            first_day,
            last_day,
            total_days: daily.span_days(),
            day_count: daily.len(),
            measurement_count: series.len(),
            ignored_count,
            assessment: summary.assess(diagnosis),
            summary,
            daily,
            distribution,
            series,
        })
    }

    /// Load `start..=end` in `zone` and assemble
    pub fn load(
        conn: &Connection,
        diagnosis: &PressureDiagnosis,
        zone: &Zone,
        start: NaiveDate,
        end: NaiveDate,
        label: Option<String>,
    ) -> DbResult<Option<Self>> {
        let measurements = Measurement::list_by_date_range(conn, start, end, zone)?;
        Ok(Self::assemble(&measurements, diagnosis, start, end, label))
    }
}
