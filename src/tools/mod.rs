//! bpstats Tools module
//!
//! Tool implementations behind the MCP server. Every function returns a
//! serialisable response or a message describing what went wrong.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::zone::Zone;

pub mod measurements;
pub mod patient;
pub mod reports;
pub mod status;

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}' (expected YYYY-MM-DD): {}", value, e))
}

/// Parse an RFC 3339 timestamp, or a local `YYYY-MM-DD HH:MM[:SS]` read in `zone`
pub fn parse_timestamp(value: &str, zone: &Zone) -> Result<DateTime<FixedOffset>, String> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| zone.localize(naive))
        .ok_or_else(|| format!("Invalid timestamp '{}' (expected RFC 3339 or YYYY-MM-DD HH:MM)", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let zone: Zone = "+02:00".parse().unwrap();
        let local = parse_timestamp("2022-03-13 16:57", &zone).unwrap();
        assert_eq!(local.to_rfc3339(), "2022-03-13T16:57:00+02:00");

        let explicit = parse_timestamp("2022-03-13T16:57:00Z", &zone).unwrap();
        assert_eq!(explicit.offset().local_minus_utc(), 0);

        assert!(parse_timestamp("13.03.2022 16:57", &zone).is_err());
        assert!(parse_date("2022-02-30").is_err());
    }
}
