//! CSV exports of blutdruckdaten.de
//!
//! One quoted, comma separated record per line:
//!
//! ```text
//! "13.03.2022","16:57","120","80","0","","","","","","","x",""
//!  date         time    sys   dia   pulse  six free fields  ignore  rest
//! ```
//!
//! Lines of any other shape (headers, footers, damaged rows) are skipped.

use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use encoding_rs::Encoding;
use regex::Regex;
use tracing::{debug, info};

use super::{default_encoding, DataImporter, ImportError, ImporterKey, InputFormat};
use crate::models::{Measurement, Pressure};
use crate::zone::Zone;

pub const ORIGIN: &str = "blutdruckdaten.de";

// Free-text fields may contain CSV-escaped quotes (`""`), never a bare one,
// so the ignore marker is always the twelfth field.
static RECORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^"([0-9]{2}\.[0-9]{2}\.[0-9]{4})","([0-9]{2}:[0-9]{2})","([0-9]{1,3})","([0-9]{1,3})","[0-9]{0,3}",(?:"(?:[^"]|"")*",){6}"([xX]?)",.*$"#,
    )
    .expect("Invalid record pattern")
});

/// Parse one line into a measurement taken in `zone`.
///
/// Returns `None` for lines that are not records, and for records whose
/// date or time does not exist on the calendar (`31.02.2022`, `24:10`).
pub fn parse_line(line: &str, zone: &Zone) -> Option<Measurement> {
    let caps = RECORD.captures(line)?;

    let stamp = format!("{} {}", &caps[1], &caps[2]);
    let naive = match NaiveDateTime::parse_from_str(&stamp, "%d.%m.%Y %H:%M") {
        Ok(naive) => naive,
        Err(e) => {
            debug!(line, error = %e, "Skipping record with impossible date");
            return None;
        }
    };

    // at most three digits, always fits
    let systolic: f64 = caps[3].parse().ok()?;
    let diastolic: f64 = caps[4].parse().ok()?;
    let ignored = !caps[5].trim().is_empty();

    Some(Measurement::new(
        zone.localize(naive),
        Pressure::mmhg(systolic),
        Pressure::mmhg(diastolic),
        ignored,
    ))
}

/// Decode `bytes` (a byte-order mark wins over `encoding`) and parse every
/// line, keeping file order
pub fn parse_bytes(bytes: &[u8], zone: &Zone, encoding: &'static Encoding) -> Vec<Measurement> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        debug!(encoding = used.name(), "Input contained malformed sequences, replaced");
    }

    let mut skipped = 0usize;
    let measurements: Vec<Measurement> = text
        .lines()
        .filter_map(|line| {
            let parsed = parse_line(line, zone);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    debug!(records = measurements.len(), skipped, "Parsed blutdruckdaten export");
    measurements
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlutdruckdatenCsvImporter;

impl DataImporter for BlutdruckdatenCsvImporter {
    fn key(&self) -> ImporterKey {
        ImporterKey::new(InputFormat::Csv, ORIGIN)
    }

    fn parse(&self, source: &Path, zone: &Zone, encoding: Option<&'static Encoding>) -> Result<Vec<Measurement>, ImportError> {
        let bytes = std::fs::read(source).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ImportError::FileMissing(source.to_path_buf())
            } else {
                ImportError::Io {
                    path: source.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let encoding = encoding.unwrap_or_else(default_encoding);
        let measurements = parse_bytes(&bytes, zone, encoding);
        info!(
            file = %source.display(),
            encoding = encoding.name(),
            count = measurements.len(),
            "Read measurements"
        );
        Ok(measurements)
    }
}
