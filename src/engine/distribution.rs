//! Severity distribution
//!
//! Counts how many samples fall into each severity, for systolic and
//! diastolic separately, and turns the counts into percentages.

use std::collections::BTreeMap;

use serde::Serialize;

use super::diagnosis::PressureDiagnosis;
use super::sample::PressureSample;
use super::severity::Severity;

/// Counts and percentages for one severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DistributionBucket {
    pub systolic_count: usize,
    pub systolic_percent: f64,
    pub diastolic_count: usize,
    pub diastolic_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    total: usize,
    buckets: BTreeMap<Severity, DistributionBucket>,
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * count as f64 / total as f64
    }
}

impl Distribution {
    /// Classify every sample's systolic and diastolic value independently
    pub fn distribute(diagnosis: &PressureDiagnosis, samples: &[PressureSample]) -> Self {
        let mut buckets: BTreeMap<Severity, DistributionBucket> = BTreeMap::new();

        for sample in samples {
            buckets
                .entry(diagnosis.classify_systolic(sample.systolic()))
                .or_default()
                .systolic_count += 1;
            buckets
                .entry(diagnosis.classify_diastolic(sample.diastolic()))
                .or_default()
                .diastolic_count += 1;
        }

        let total = samples.len();
        for bucket in buckets.values_mut() {
            bucket.systolic_percent = percent(bucket.systolic_count, total);
            bucket.diastolic_percent = percent(bucket.diastolic_count, total);
        }

        Self { total, buckets }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Bucket for `severity`; severities never observed read as empty
    pub fn bucket(&self, severity: Severity) -> DistributionBucket {
        self.buckets.get(&severity).copied().unwrap_or_default()
    }

    /// All seven buckets in ascending severity, empty ones included
    pub fn rows(&self) -> Vec<(Severity, DistributionBucket)> {
        Severity::ALL.iter().map(|s| (*s, self.bucket(*s))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnosis() -> PressureDiagnosis {
        PressureDiagnosis::standard().unwrap()
    }

    #[test]
    fn test_half_optimal_is_fifty_percent() {
        let samples = [
            PressureSample::new(110, 70),
            PressureSample::new(115, 75),
            PressureSample::new(135, 88),
            PressureSample::new(150, 95),
        ];
        let dist = Distribution::distribute(&diagnosis(), &samples);
        assert_eq!(dist.total(), 4);
        assert_eq!(dist.bucket(Severity::Optimal).systolic_count, 2);
        assert_eq!(dist.bucket(Severity::Optimal).systolic_percent, 50.0);
        assert_eq!(dist.bucket(Severity::NormalHigh).diastolic_percent, 25.0);
    }

    #[test]
    fn test_missing_buckets_read_as_empty() {
        let dist = Distribution::distribute(&diagnosis(), &[PressureSample::new(120, 80)]);
        let high3 = dist.bucket(Severity::High3);
        assert_eq!(high3.systolic_count, 0);
        assert_eq!(high3.systolic_percent, 0.0);
        assert_eq!(dist.rows().len(), 7);
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let samples: Vec<PressureSample> = (0..29).map(|i| PressureSample::new(95 + i * 4, 60 + i * 2)).collect();
        let dist = Distribution::distribute(&diagnosis(), &samples);
        let systolic: f64 = dist.rows().iter().map(|(_, b)| b.systolic_percent).sum();
        let diastolic: f64 = dist.rows().iter().map(|(_, b)| b.diastolic_percent).sum();
        assert!((systolic - 100.0).abs() < 1e-9);
        assert!((diastolic - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_population() {
        let dist = Distribution::distribute(&diagnosis(), &[]);
        assert_eq!(dist.total(), 0);
        assert!(dist.rows().iter().all(|(_, b)| *b == DistributionBucket::default()));
    }
}
