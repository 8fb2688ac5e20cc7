//! Range tables
//!
//! Ordered threshold-to-severity lookup. A table is data, not branching:
//! a sorted list of exclusive upper bounds, each naming the category for the
//! values below it, plus a fallback for everything at or above the last bound.

use thiserror::Error;

use super::severity::Severity;

/// Configuration errors raised while building a table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeTableError {
    #[error("Range table needs at least one boundary")]
    Empty,

    #[error("Range boundaries must be strictly increasing: {previous} is followed by {next}")]
    NotIncreasing { previous: i32, next: i32 },
}

/// Total classifier over all integers.
///
/// `(-inf, b1)` maps to the first listed category, `[b(k-1), bk)` to the
/// k-th, and `[last bound, +inf)` to the fallback. A value equal to a bound
/// therefore resolves to the upper bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeClassifier {
    ranges: Vec<(i32, Severity)>,
    fallback: Severity,
}

impl RangeClassifier {
    /// Build a table from `(upper bound exclusive, category)` pairs.
    ///
    /// # Errors
    ///
    /// Fails when no pair is given or the bounds are not strictly increasing.
    pub fn new(fallback: Severity, ranges: &[(i32, Severity)]) -> Result<Self, RangeTableError> {
        if ranges.is_empty() {
            return Err(RangeTableError::Empty);
        }
        for pair in ranges.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(RangeTableError::NotIncreasing {
                    previous: pair[0].0,
                    next: pair[1].0,
                });
            }
        }

        Ok(Self {
            ranges: ranges.to_vec(),
            fallback,
        })
    }

    pub fn classify(&self, value: i32) -> Severity {
        // index of the first bound strictly above `value`
        let idx = self.ranges.partition_point(|(bound, _)| *bound <= value);
        self.ranges
            .get(idx)
            .map(|(_, severity)| *severity)
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Severity {
        self.fallback
    }

    pub fn ranges(&self) -> &[(i32, Severity)] {
        &self.ranges
    }

    /// Closed-open bounds `[lower, upper)` of the values that classify as
    /// `severity`; `None` on a side means unbounded. Returns `None` when the
    /// table never yields that category.
    pub fn bounds_of(&self, severity: Severity) -> Option<(Option<i32>, Option<i32>)> {
        if let Some(idx) = self.ranges.iter().position(|(_, s)| *s == severity) {
            let lower = idx.checked_sub(1).map(|prev| self.ranges[prev].0);
            return Some((lower, Some(self.ranges[idx].0)));
        }
        if severity == self.fallback {
            return self.ranges.last().map(|(bound, _)| (Some(*bound), None));
        }
        None
    }

    /// Short caption for a category, e.g. `(< 105)`, `(105-119)`, `(>= 180)`
    pub fn caption(&self, severity: Severity) -> String {
        match self.bounds_of(severity) {
            Some((None, Some(upper))) => format!("(< {})", upper),
            Some((Some(lower), Some(upper))) => format!("({}-{})", lower, upper - 1),
            Some((Some(lower), None)) => format!("(>= {})", lower),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RangeClassifier {
        RangeClassifier::new(
            Severity::High3,
            &[(10, Severity::Low), (20, Severity::Optimal), (30, Severity::Normal)],
        )
        .unwrap()
    }

    #[test]
    fn test_boundary_goes_to_upper_bucket() {
        let t = table();
        assert_eq!(t.classify(9), Severity::Low);
        assert_eq!(t.classify(10), Severity::Optimal);
        assert_eq!(t.classify(19), Severity::Optimal);
        assert_eq!(t.classify(20), Severity::Normal);
        assert_eq!(t.classify(29), Severity::Normal);
        assert_eq!(t.classify(30), Severity::High3);
    }

    #[test]
    fn test_extremes_are_classified() {
        let t = table();
        assert_eq!(t.classify(i32::MIN), Severity::Low);
        assert_eq!(t.classify(-5), Severity::Low);
        assert_eq!(t.classify(i32::MAX), Severity::High3);
    }

    #[test]
    fn test_rejects_non_increasing_bounds() {
        let err = RangeClassifier::new(
            Severity::High3,
            &[(10, Severity::Low), (10, Severity::Optimal)],
        )
        .unwrap_err();
        assert_eq!(err, RangeTableError::NotIncreasing { previous: 10, next: 10 });

        let err = RangeClassifier::new(
            Severity::High3,
            &[(20, Severity::Low), (10, Severity::Optimal)],
        )
        .unwrap_err();
        assert_eq!(err, RangeTableError::NotIncreasing { previous: 20, next: 10 });
    }

    #[test]
    fn test_rejects_empty_table() {
        assert_eq!(RangeClassifier::new(Severity::High3, &[]), Err(RangeTableError::Empty));
    }

    #[test]
    fn test_captions() {
        let t = table();
        assert_eq!(t.caption(Severity::Low), "(< 10)");
        assert_eq!(t.caption(Severity::Optimal), "(10-19)");
        assert_eq!(t.caption(Severity::High3), "(>= 30)");
        assert_eq!(t.caption(Severity::High1), "");
        assert_eq!(t.bounds_of(Severity::High1), None);
    }
}
