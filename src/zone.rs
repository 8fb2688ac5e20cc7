//! Time zones
//!
//! The zone measurements are interpreted in and reported in. Only UTC, the
//! host's local zone and fixed offsets are supported.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown time zone '{0}' (expected UTC, local or an offset like +01:00)")]
pub struct ZoneParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl Zone {
    /// Attach this zone to a wall-clock time.
    ///
    /// A time inside a daylight-saving gap is moved forward by one hour; a
    /// time that occurs twice resolves to the earlier instant.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            Zone::Utc => Utc.from_utc_datetime(&naive).fixed_offset(),
            Zone::Fixed(offset) => resolve(offset, naive),
            Zone::Local => resolve(&Local, naive),
        }
    }

    /// The same instant seen from this zone
    pub fn to_zone<Tz: TimeZone>(&self, instant: &DateTime<Tz>) -> DateTime<FixedOffset> {
        match self {
            Zone::Utc => instant.with_timezone(&Utc).fixed_offset(),
            Zone::Fixed(offset) => instant.with_timezone(offset),
            Zone::Local => instant.with_timezone(&Local).fixed_offset(),
        }
    }

    /// First instant of `date` in this zone
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        self.localize(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn today(&self) -> NaiveDate {
        self.to_zone(&Utc::now()).date_naive()
    }
}

fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.fixed_offset();
    }
    let shifted = naive + Duration::hours(1);
    match tz.from_local_datetime(&shifted).earliest() {
        Some(dt) => dt.fixed_offset(),
        // no zone has a gap longer than an hour at this point; fall back to UTC
        None => Utc.from_utc_datetime(&naive).fixed_offset(),
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    if hours.is_empty() || hours.len() > 2 || minutes.len() > 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl FromStr for Zone {
    type Err = ZoneParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" | "gmt" => Ok(Zone::Utc),
            "local" | "" => Ok(Zone::Local),
            _ => parse_offset(trimmed)
                .map(Zone::Fixed)
                .ok_or_else(|| ZoneParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Utc => f.write_str("UTC"),
            Zone::Local => f.write_str("local"),
            Zone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Zone::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_parse() {
        assert_eq!("UTC".parse::<Zone>(), Ok(Zone::Utc));
        assert_eq!("local".parse::<Zone>(), Ok(Zone::Local));
        assert_eq!("+01:00".parse::<Zone>(), Ok(Zone::Fixed(FixedOffset::east_opt(3600).unwrap())));
        assert_eq!("-0530".parse::<Zone>(), Ok(Zone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap())));
        assert_eq!("+2".parse::<Zone>(), Ok(Zone::Fixed(FixedOffset::east_opt(7200).unwrap())));
        assert!("Europe/Berlin".parse::<Zone>().is_err());
        assert!("+01:75".parse::<Zone>().is_err());
    }

    #[test]
    fn test_localize_utc() {
        let dt = Zone::Utc.localize(naive(2022, 3, 13, 16, 57));
        assert_eq!(dt.to_rfc3339(), "2022-03-13T16:57:00+00:00");
    }

    #[test]
    fn test_localize_fixed_and_convert() {
        let zone: Zone = "+01:00".parse().unwrap();
        let dt = zone.localize(naive(2022, 3, 13, 0, 30));
        assert_eq!(dt.to_rfc3339(), "2022-03-13T00:30:00+01:00");
        let utc = Zone::Utc.to_zone(&dt);
        assert_eq!(utc.to_rfc3339(), "2022-03-12T23:30:00+00:00");
    }

    #[test]
    fn test_start_of_day() {
        let zone: Zone = "-02:00".parse().unwrap();
        let start = zone.start_of_day(NaiveDate::from_ymd_opt(2022, 1, 1).unwrap());
        assert_eq!(start.with_timezone(&Utc).to_rfc3339(), "2022-01-01T02:00:00+00:00");
    }
}
