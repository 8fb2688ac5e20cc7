//! Pressure sample
//!
//! The integer systolic/diastolic pair every statistic works on.

use serde::Serialize;

/// A systolic/diastolic pair in whole mmHg plus its pulse pressure.
///
/// Samples built with [`PressureSample::new`] always satisfy
/// `pulse_pressure == systolic - diastolic`. Samples produced by the
/// estimators in [`crate::engine::stats`] carry a pulse pressure estimated
/// from the pulse-pressure column on its own; for the median that value may
/// differ from `systolic - diastolic` of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PressureSample {
    systolic: i32,
    diastolic: i32,
    pulse_pressure: i32,
}

impl PressureSample {
    pub fn new(systolic: i32, diastolic: i32) -> Self {
        Self {
            systolic,
            diastolic,
            pulse_pressure: systolic.saturating_sub(diastolic),
        }
    }

    /// Estimator output: all three columns estimated independently
    pub(crate) fn from_estimates(systolic: i32, diastolic: i32, pulse_pressure: i32) -> Self {
        Self {
            systolic,
            diastolic,
            pulse_pressure,
        }
    }

    pub fn systolic(&self) -> i32 {
        self.systolic
    }

    pub fn diastolic(&self) -> i32 {
        self.diastolic
    }

    pub fn pulse_pressure(&self) -> i32 {
        self.pulse_pressure
    }
}

impl std::fmt::Display for PressureSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} mmHg (PP {})", self.systolic, self.diastolic, self.pulse_pressure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_pulse_pressure() {
        let sample = PressureSample::new(128, 83);
        assert_eq!(sample.pulse_pressure(), 45);
    }

    #[test]
    fn test_new_with_extreme_values() {
        let sample = PressureSample::new(i32::MAX, i32::MIN);
        assert_eq!(sample.pulse_pressure(), i32::MAX);
        let sample = PressureSample::new(i32::MIN, i32::MAX);
        assert_eq!(sample.pulse_pressure(), i32::MIN);
    }

    #[test]
    fn test_display() {
        assert_eq!(PressureSample::new(120, 80).to_string(), "120/80 mmHg (PP 40)");
    }
}
