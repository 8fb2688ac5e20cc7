//! Calendar quarter arithmetic

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

/// Inclusive date range of one reporting period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// e.g. `2022-Q1`
    pub label: String,
}

impl PeriodBounds {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Bounds of the quarter `quarters_back` quarters before the one containing
/// `reference`. Dates beyond chrono's range saturate at its limits.
pub fn quarter_bounds(reference: NaiveDate, quarters_back: u32) -> PeriodBounds {
    let first_month = (reference.month0() / 3) * 3 + 1;
    let current_start = NaiveDate::from_ymd_opt(reference.year(), first_month, 1).unwrap_or(reference);

    let start = quarters_back
        .checked_mul(3)
        .and_then(|months| current_start.checked_sub_months(Months::new(months)))
        .unwrap_or(NaiveDate::MIN);
    let end = start
        .checked_add_months(Months::new(3))
        .and_then(|next| next.pred_opt())
        .unwrap_or(NaiveDate::MAX);

    PeriodBounds {
        start,
        end,
        label: format!("{}-Q{}", start.year(), start.month0() / 3 + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_current_quarter() {
        let q = quarter_bounds(date(2022, 3, 13), 0);
        assert_eq!(q.start, date(2022, 1, 1));
        assert_eq!(q.end, date(2022, 3, 31));
        assert_eq!(q.label, "2022-Q1");
    }

    #[test]
    fn test_previous_quarter_crosses_year() {
        let q = quarter_bounds(date(2022, 3, 13), 1);
        assert_eq!(q.start, date(2021, 10, 1));
        assert_eq!(q.end, date(2021, 12, 31));
        assert_eq!(q.label, "2021-Q4");
    }

    #[test]
    fn test_quarter_ends() {
        assert_eq!(quarter_bounds(date(2024, 5, 31), 0).end, date(2024, 6, 30));
        assert_eq!(quarter_bounds(date(2024, 9, 1), 0).end, date(2024, 9, 30));
        assert_eq!(quarter_bounds(date(2024, 12, 31), 0).start, date(2024, 10, 1));
        assert_eq!(quarter_bounds(date(2024, 12, 31), 8).start, date(2022, 10, 1));
    }

    #[test]
    fn test_contains() {
        let q = quarter_bounds(date(2022, 3, 13), 0);
        assert!(q.contains(date(2022, 1, 1)));
        assert!(q.contains(date(2022, 3, 31)));
        assert!(!q.contains(date(2022, 4, 1)));
    }

    #[test]
    fn test_huge_offset_saturates() {
        let q = quarter_bounds(date(2022, 3, 13), u32::MAX);
        assert_eq!(q.start, NaiveDate::MIN);
    }
}
