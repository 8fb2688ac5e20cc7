//! Daily compression
//!
//! Reduces any number of same-day samples to one plain-averaged sample per
//! calendar date.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::warn;

use super::sample::PressureSample;
use super::stats;

/// One representative sample per calendar day, ascending by date
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyValues {
    days: BTreeMap<NaiveDate, PressureSample>,
}

impl DailyValues {
    pub fn get(&self, date: NaiveDate) -> Option<&PressureSample> {
        self.days.get(&date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.days.keys().next().copied()
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.days.keys().next_back().copied()
    }

    /// Calendar days from the first to the last day, both inclusive
    pub fn span_days(&self) -> i64 {
        match (self.first_day(), self.last_day()) {
            (Some(first), Some(last)) => (last - first).num_days() + 1,
            _ => 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &PressureSample)> {
        self.days.iter().map(|(date, sample)| (*date, sample))
    }

    /// Daily values in date order
    pub fn samples(&self) -> Vec<PressureSample> {
        self.days.values().copied().collect()
    }
}

/// Group timestamped samples by calendar date and average each day.
///
/// The date of a sample is taken in the offset its timestamp carries. Input
/// is expected in ascending timestamp order; anything else is logged and a
/// sorted copy is grouped instead.
pub fn compress_to_days(samples: &[(DateTime<FixedOffset>, PressureSample)]) -> DailyValues {
    let sorted_copy;
    let ordered: &[(DateTime<FixedOffset>, PressureSample)] =
        if samples.windows(2).all(|w| w[0].0 <= w[1].0) {
            samples
        } else {
            warn!(count = samples.len(), "Samples passed to daily compression are not in time order, sorting a copy");
            let mut copy = samples.to_vec();
            copy.sort_by_key(|(timestamp, _)| *timestamp);
            sorted_copy = copy;
            &sorted_copy
        };

    let mut days = BTreeMap::new();
    let mut current: Option<NaiveDate> = None;
    let mut group: Vec<PressureSample> = Vec::new();

    for (timestamp, sample) in ordered {
        let date = timestamp.date_naive();
        if current != Some(date) {
            flush(&mut days, current, &mut group);
            current = Some(date);
        }
        group.push(*sample);
    }
    flush(&mut days, current, &mut group);

    DailyValues { days }
}

fn flush(days: &mut BTreeMap<NaiveDate, PressureSample>, date: Option<NaiveDate>, group: &mut Vec<PressureSample>) {
    if let (Some(date), Some(average)) = (date, stats::average(group)) {
        days.insert(date, average);
    }
    group.clear();
}
