//! Aggregation and classification engine
//!
//! Pure, synchronous building blocks: range tables and diagnosis, daily
//! compression, typical-value estimators, severity distribution and
//! quarter arithmetic.

pub mod daily;
pub mod diagnosis;
pub mod distribution;
pub mod period;
pub mod range;
pub mod sample;
pub mod severity;
pub mod stats;

pub use daily::{compress_to_days, DailyValues};
pub use diagnosis::PressureDiagnosis;
pub use distribution::{Distribution, DistributionBucket};
pub use period::{quarter_bounds, PeriodBounds};
pub use range::{RangeClassifier, RangeTableError};
pub use sample::PressureSample;
pub use severity::Severity;
pub use stats::{average, end_weighted_average, median, median_of, summarize, Summary, SummaryAssessment};
