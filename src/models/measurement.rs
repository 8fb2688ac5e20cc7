//! Measurement model
//!
//! A single blood-pressure reading and its persistence. One row per instant;
//! storing a reading for an instant that already exists replaces it.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::engine::PressureSample;
use crate::zone::Zone;

/// mmHg per kPa
const MMHG_PER_KPA: f64 = 7.500_615_758;

/// Whole-mmHg values a reading may carry, the span of the three-digit import fields
pub const MMHG_RANGE: std::ops::RangeInclusive<i32> = 1..=999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PressureUnit {
    #[serde(rename = "mmHg")]
    MillimetreOfMercury,
    #[serde(rename = "kPa")]
    Kilopascal,
}

impl PressureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            PressureUnit::MillimetreOfMercury => "mmHg",
            PressureUnit::Kilopascal => "kPa",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mmhg" | "mm hg" | "torr" => Some(PressureUnit::MillimetreOfMercury),
            "kpa" => Some(PressureUnit::Kilopascal),
            _ => None,
        }
    }
}

/// A pressure magnitude with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pressure {
    pub value: f64,
    pub unit: PressureUnit,
}

impl Pressure {
    pub fn mmhg(value: f64) -> Self {
        Self {
            value,
            unit: PressureUnit::MillimetreOfMercury,
        }
    }

    pub fn kpa(value: f64) -> Self {
        Self {
            value,
            unit: PressureUnit::Kilopascal,
        }
    }

    /// Whole mmHg, rounded half away from zero
    pub fn to_mmhg(&self) -> i32 {
        let mmhg = match self.unit {
            PressureUnit::MillimetreOfMercury => self.value,
            PressureUnit::Kilopascal => self.value * MMHG_PER_KPA,
        };
        mmhg.round() as i32
    }

    /// Whole mmHg if the value is finite and inside [`MMHG_RANGE`]
    pub fn checked_mmhg(&self) -> Option<i32> {
        let mmhg = match self.unit {
            PressureUnit::MillimetreOfMercury => self.value,
            PressureUnit::Kilopascal => self.value * MMHG_PER_KPA,
        }
        .round();
        let range = f64::from(*MMHG_RANGE.start())..=f64::from(*MMHG_RANGE.end());
        range.contains(&mmhg).then_some(mmhg as i32)
    }
}

impl std::fmt::Display for Pressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit.as_str())
    }
}

/// One blood-pressure reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub timestamp: DateTime<FixedOffset>,
    pub systolic: Pressure,
    pub diastolic: Pressure,
    /// Kept in storage, excluded from every statistic
    pub ignored: bool,
}

/// Storage form of the instant: UTC, second precision, sorts lexically
fn storage_key(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Measurement {
    pub fn new(timestamp: DateTime<FixedOffset>, systolic: Pressure, diastolic: Pressure, ignored: bool) -> Self {
        Self {
            timestamp,
            systolic,
            diastolic,
            ignored,
        }
    }

    pub fn systolic_mmhg(&self) -> i32 {
        self.systolic.to_mmhg()
    }

    pub fn diastolic_mmhg(&self) -> i32 {
        self.diastolic.to_mmhg()
    }

    pub fn sample(&self) -> PressureSample {
        PressureSample::new(self.systolic_mmhg(), self.diastolic_mmhg())
    }

    /// Unique key of the row, the instant in UTC
    pub fn storage_key(&self) -> String {
        storage_key(&self.timestamp)
    }

    /// Create from a database row, presenting the instant in `zone`
    fn from_row(row: &Row, zone: &Zone) -> rusqlite::Result<Self> {
        let key: String = row.get("measured_at")?;
        let instant = DateTime::parse_from_rfc3339(&key).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let systolic: i32 = row.get("systolic")?;
        let diastolic: i32 = row.get("diastolic")?;
        let ignored: bool = row.get("ignored")?;

        Ok(Self {
            timestamp: zone.to_zone(&instant),
            systolic: Pressure::mmhg(systolic as f64),
            diastolic: Pressure::mmhg(diastolic as f64),
            ignored,
        })
    }

    /// Insert, or replace the reading already stored for the same instant
    pub fn store(conn: &Connection, measurement: &Measurement) -> DbResult<()> {
        conn.execute(
            r#"
            INSERT INTO measurements (measured_at, utc_offset, systolic, diastolic, ignored)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(measured_at) DO UPDATE SET
                utc_offset = excluded.utc_offset,
                systolic = excluded.systolic,
                diastolic = excluded.diastolic,
                ignored = excluded.ignored,
                updated_at = datetime('now')
            "#,
            params![
                storage_key(&measurement.timestamp),
                measurement.timestamp.offset().local_minus_utc(),
                measurement.systolic_mmhg(),
                measurement.diastolic_mmhg(),
                measurement.ignored,
            ],
        )?;
        Ok(())
    }

    /// Store a batch in one transaction; returns the number of rows written
    pub fn store_all(conn: &mut Connection, measurements: &[Measurement]) -> DbResult<usize> {
        let tx = conn.transaction()?;
        for measurement in measurements {
            Self::store(&tx, measurement)?;
        }
        tx.commit()?;
        Ok(measurements.len())
    }

    /// Readings whose local date in `zone` lies in `start..=end`, ordered by
    /// time. Ignored readings are included.
    pub fn list_by_date_range(conn: &Connection, start: NaiveDate, end: NaiveDate, zone: &Zone) -> DbResult<Vec<Self>> {
        if end < start {
            return Ok(Vec::new());
        }
        let from = storage_key(&zone.start_of_day(start));
        let until = match end.succ_opt() {
            Some(next) => storage_key(&zone.start_of_day(next)),
            None => "9999-12-31T23:59:59Z".to_string(),
        };

        let mut stmt = conn.prepare(
            "SELECT * FROM measurements WHERE measured_at >= ?1 AND measured_at < ?2 ORDER BY measured_at",
        )?;
        let rows = stmt
            .query_map(params![from, until], |row| Self::from_row(row, zone))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Every reading in the offset it was recorded with, ordered by time
    pub fn list_recorded(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM measurements ORDER BY measured_at")?;
        let rows = stmt
            .query_map([], |row| {
                let seconds: i32 = row.get("utc_offset")?;
                let zone = FixedOffset::east_opt(seconds).map(Zone::Fixed).unwrap_or(Zone::Utc);
                Self::from_row(row, &zone)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn list_all(conn: &Connection, zone: &Zone) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM measurements ORDER BY measured_at")?;
        let rows = stmt
            .query_map([], |row| Self::from_row(row, zone))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))
            .map_err(DbError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use chrono::TimeZone;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn reading(zone: &Zone, day: u32, hour: u32, s: f64, d: f64, ignored: bool) -> Measurement {
        let naive = NaiveDate::from_ymd_opt(2022, 3, day).unwrap().and_hms_opt(hour, 0, 0).unwrap();
        Measurement::new(zone.localize(naive), Pressure::mmhg(s), Pressure::mmhg(d), ignored)
    }

    #[test]
    fn test_pressure_conversion() {
        assert_eq!(Pressure::mmhg(120.4).to_mmhg(), 120);
        assert_eq!(Pressure::mmhg(120.5).to_mmhg(), 121);
        assert_eq!(Pressure::kpa(16.0).to_mmhg(), 120);
    }

    #[test]
    fn test_checked_mmhg() {
        assert_eq!(Pressure::mmhg(120.4).checked_mmhg(), Some(120));
        assert_eq!(Pressure::kpa(16.0).checked_mmhg(), Some(120));
        assert_eq!(Pressure::mmhg(999.0).checked_mmhg(), Some(999));
        assert_eq!(Pressure::mmhg(0.4).checked_mmhg(), None);
        assert_eq!(Pressure::mmhg(1000.0).checked_mmhg(), None);
        assert_eq!(Pressure::mmhg(1e12).checked_mmhg(), None);
        assert_eq!(Pressure::mmhg(-1e12).checked_mmhg(), None);
        assert_eq!(Pressure::mmhg(f64::NAN).checked_mmhg(), None);
        assert_eq!(Pressure::kpa(f64::INFINITY).checked_mmhg(), None);
        assert_eq!(PressureUnit::from_str("mmHg"), Some(PressureUnit::MillimetreOfMercury));
        assert_eq!(PressureUnit::from_str("psi"), None);
    }

    #[test]
    fn test_store_and_list_range() {
        let mut conn = test_conn();
        let zone = Zone::Utc;
        let rows = vec![
            reading(&zone, 10, 8, 120.0, 80.0, false),
            reading(&zone, 12, 8, 130.0, 85.0, true),
            reading(&zone, 20, 8, 140.0, 90.0, false),
        ];
        assert_eq!(Measurement::store_all(&mut conn, &rows).unwrap(), 3);
        assert_eq!(Measurement::count(&conn).unwrap(), 3);

        let start = NaiveDate::from_ymd_opt(2022, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 12).unwrap();
        let listed = Measurement::list_by_date_range(&conn, start, end, &zone).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], rows[0]);
        assert!(listed[1].ignored);
    }

    #[test]
    fn test_store_replaces_same_instant() {
        let conn = test_conn();
        let zone = Zone::Utc;
        Measurement::store(&conn, &reading(&zone, 1, 8, 120.0, 80.0, false)).unwrap();
        Measurement::store(&conn, &reading(&zone, 1, 8, 125.0, 82.0, true)).unwrap();

        let all = Measurement::list_all(&conn, &zone).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sample(), PressureSample::new(125, 82));
        assert!(all[0].ignored);
    }

    #[test]
    fn test_range_follows_zone_day_boundaries() {
        let conn = test_conn();
        let plus_two: Zone = "+02:00".parse().unwrap();
        // 2022-03-10 01:00 at +02:00 is 2022-03-09 23:00 UTC
        Measurement::store(&conn, &reading(&plus_two, 10, 1, 120.0, 80.0, false)).unwrap();

        let day = NaiveDate::from_ymd_opt(2022, 3, 10).unwrap();
        let local = Measurement::list_by_date_range(&conn, day, day, &plus_two).unwrap();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].timestamp.date_naive(), day);

        let utc = Measurement::list_by_date_range(&conn, day, day, &Zone::Utc).unwrap();
        assert!(utc.is_empty());
    }

    #[test]
    fn test_listed_timestamps_are_in_requested_zone() {
        let conn = test_conn();
        let instant = Utc.with_ymd_and_hms(2022, 3, 13, 16, 57, 0).unwrap().fixed_offset();
        Measurement::store(&conn, &Measurement::new(instant, Pressure::mmhg(120.0), Pressure::mmhg(80.0), false)).unwrap();

        let zone: Zone = "+01:00".parse().unwrap();
        let all = Measurement::list_all(&conn, &zone).unwrap();
        assert_eq!(all[0].timestamp.to_rfc3339(), "2022-03-13T17:57:00+01:00");
        assert_eq!(all[0].timestamp, instant);
    }
}
