//! Typical-value estimators
//!
//! Plain average, end-weighted average and median over an ordered sequence
//! of samples. Every estimator works on the three columns (systolic,
//! diastolic, pulse pressure) independently and truncates toward zero.
//! Empty input yields `None`.

use serde::Serialize;

use super::diagnosis::PressureDiagnosis;
use super::sample::PressureSample;
use super::severity::Severity;

fn columns(samples: &[PressureSample]) -> [Vec<i64>; 3] {
    [
        samples.iter().map(|s| s.systolic() as i64).collect(),
        samples.iter().map(|s| s.diastolic() as i64).collect(),
        samples.iter().map(|s| s.pulse_pressure() as i64).collect(),
    ]
}

fn from_columns(values: [i64; 3]) -> PressureSample {
    PressureSample::from_estimates(values[0] as i32, values[1] as i32, values[2] as i32)
}

pub fn average(samples: &[PressureSample]) -> Option<PressureSample> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as i64;
    let sums = columns(samples).map(|column| column.iter().sum::<i64>() / n);
    Some(from_columns(sums))
}

/// Mean with weights `1..=n` in input order, so later samples dominate.
/// The divisor is `n(n+1)/2`.
pub fn end_weighted_average(samples: &[PressureSample]) -> Option<PressureSample> {
    if samples.is_empty() {
        return None;
    }
    let n = samples.len() as i64;
    let weight_sum = n * (n + 1) / 2;
    let values = columns(samples).map(|column| {
        column
            .iter()
            .zip(1i64..)
            .map(|(value, weight)| value * weight)
            .sum::<i64>()
            / weight_sum
    });
    Some(from_columns(values))
}

/// Standard median of one column: the middle element for odd length, the
/// truncated mean of the two central elements for even length.
pub fn median_of(values: &[i32]) -> Option<i32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        let low = sorted[n / 2 - 1] as i64;
        let high = sorted[n / 2] as i64;
        Some(((low + high) / 2) as i32)
    }
}

/// Column-wise median. The result's pulse pressure is the median of the
/// pulse-pressure column and need not equal systolic minus diastolic.
pub fn median(samples: &[PressureSample]) -> Option<PressureSample> {
    let systolic: Vec<i32> = samples.iter().map(|s| s.systolic()).collect();
    let diastolic: Vec<i32> = samples.iter().map(|s| s.diastolic()).collect();
    let pulse: Vec<i32> = samples.iter().map(|s| s.pulse_pressure()).collect();

    Some(PressureSample::from_estimates(
        median_of(&systolic)?,
        median_of(&diastolic)?,
        median_of(&pulse)?,
    ))
}

/// The three estimators over one sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub average: PressureSample,
    pub weighted_average: PressureSample,
    pub median: PressureSample,
}

impl Summary {
    pub fn assess(&self, diagnosis: &PressureDiagnosis) -> SummaryAssessment {
        SummaryAssessment {
            average: diagnosis.assess(&self.average),
            weighted_average: diagnosis.assess(&self.weighted_average),
            median: diagnosis.assess(&self.median),
        }
    }
}

/// Combined severity of each estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryAssessment {
    pub average: Severity,
    pub weighted_average: Severity,
    pub median: Severity,
}

pub fn summarize(samples: &[PressureSample]) -> Option<Summary> {
    Some(Summary {
        average: average(samples)?,
        weighted_average: end_weighted_average(samples)?,
        median: median(samples)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(sample: PressureSample) -> (i32, i32, i32) {
        (sample.systolic(), sample.diastolic(), sample.pulse_pressure())
    }

    #[test]
    fn test_empty_input_yields_none() {
        assert_eq!(average(&[]), None);
        assert_eq!(end_weighted_average(&[]), None);
        assert_eq!(median(&[]), None);
        assert_eq!(median_of(&[]), None);
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_average_and_weighted_average() {
        let samples = [PressureSample::new(120, 80), PressureSample::new(140, 90)];
        assert_eq!(triple(average(&samples).unwrap()), (130, 85, 45));
        assert_eq!(triple(end_weighted_average(&samples).unwrap()), (133, 86, 46));
    }

    #[test]
    fn test_weighted_divisor_for_odd_length() {
        // weights 1,2,3 over 6: (100 + 200 + 300) / 6
        let samples = [
            PressureSample::new(100, 60),
            PressureSample::new(100, 60),
            PressureSample::new(100, 60),
        ];
        assert_eq!(triple(end_weighted_average(&samples).unwrap()), (100, 60, 40));
    }

    #[test]
    fn test_single_sample_is_its_own_estimate() {
        let samples = [PressureSample::new(123, 77)];
        let summary = summarize(&samples).unwrap();
        assert_eq!(summary.average, samples[0]);
        assert_eq!(summary.weighted_average, samples[0]);
        assert_eq!(summary.median, samples[0]);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median_of(&[120, 100, 110]), Some(110));
        assert_eq!(median_of(&[130, 100, 120, 110]), Some(115));
        assert_eq!(median_of(&[100, 101]), Some(100));
    }

    #[test]
    fn test_median_pulse_pressure_is_independent() {
        let samples = [
            PressureSample::new(150, 70), // pp 80
            PressureSample::new(120, 100), // pp 20
            PressureSample::new(130, 90), // pp 40
        ];
        let m = median(&samples).unwrap();
        assert_eq!(triple(m), (130, 90, 40));

        let samples = [
            PressureSample::new(150, 100), // pp 50
            PressureSample::new(120, 60), // pp 60
            PressureSample::new(140, 90), // pp 50
        ];
        let m = median(&samples).unwrap();
        assert_eq!((m.systolic(), m.diastolic()), (140, 90));
        assert_eq!(m.pulse_pressure(), 50);
    }

    #[test]
    fn test_pipeline_is_repeatable() {
        let samples: Vec<PressureSample> = (0..17).map(|i| PressureSample::new(110 + i * 3, 70 + i)).collect();
        assert_eq!(summarize(&samples), summarize(&samples));
    }

    #[test]
    fn test_assessment_of_summary() {
        let diagnosis = PressureDiagnosis::standard().unwrap();
        let summary = summarize(&[PressureSample::new(118, 78), PressureSample::new(146, 88)]).unwrap();
        let assessment = summary.assess(&diagnosis);
        // average 132/83 is high-normal by systolic
        assert_eq!(assessment.average, Severity::NormalHigh);
        // weighted 136/84
        assert_eq!(assessment.weighted_average, Severity::NormalHigh);
    }
}
