//! Pressure diagnosis
//!
//! Independent systolic and diastolic range tables plus the rule that
//! combines their verdicts.

use super::range::{RangeClassifier, RangeTableError};
use super::sample::PressureSample;
use super::severity::Severity;

/// Systolic bounds (mmHg, exclusive upper) for LOW..HIGH2; HIGH3 above
pub const SYSTOLIC_RANGES: [(i32, Severity); 6] = [
    (105, Severity::Low),
    (120, Severity::Optimal),
    (130, Severity::Normal),
    (140, Severity::NormalHigh),
    (160, Severity::High1),
    (180, Severity::High2),
];

/// Diastolic bounds (mmHg, exclusive upper) for LOW..HIGH2; HIGH3 above
pub const DIASTOLIC_RANGES: [(i32, Severity); 6] = [
    (65, Severity::Low),
    (80, Severity::Optimal),
    (85, Severity::Normal),
    (90, Severity::NormalHigh),
    (100, Severity::High1),
    (110, Severity::High2),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressureDiagnosis {
    systolic: RangeClassifier,
    diastolic: RangeClassifier,
}

impl PressureDiagnosis {
    /// Build from custom tables
    pub fn new(systolic: RangeClassifier, diastolic: RangeClassifier) -> Self {
        Self { systolic, diastolic }
    }

    /// The fixed clinical tables
    pub fn standard() -> Result<Self, RangeTableError> {
        Ok(Self {
            systolic: RangeClassifier::new(Severity::High3, &SYSTOLIC_RANGES)?,
            diastolic: RangeClassifier::new(Severity::High3, &DIASTOLIC_RANGES)?,
        })
    }

    pub fn classify_systolic(&self, value: i32) -> Severity {
        self.systolic.classify(value)
    }

    pub fn classify_diastolic(&self, value: i32) -> Severity {
        self.diastolic.classify(value)
    }

    /// The more severe of two verdicts
    pub fn combine(a: Severity, b: Severity) -> Severity {
        a.max(b)
    }

    pub fn assess(&self, sample: &PressureSample) -> Severity {
        Self::combine(
            self.classify_systolic(sample.systolic()),
            self.classify_diastolic(sample.diastolic()),
        )
    }

    pub fn systolic_table(&self) -> &RangeClassifier {
        &self.systolic
    }

    pub fn diastolic_table(&self) -> &RangeClassifier {
        &self.diastolic
    }
}
