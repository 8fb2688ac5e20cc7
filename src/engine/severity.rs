//! Severity scale
//!
//! Seven ordered clinical categories for a single pressure value.

use serde::{Deserialize, Serialize};

/// Clinical severity of a pressure value, ordered from least to most severe.
///
/// The derived `Ord` follows declaration order, so `Severity::Low < Severity::High3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Optimal,
    Normal,
    NormalHigh,
    High1,
    High2,
    High3,
}

impl Severity {
    /// All categories in ascending order
    pub const ALL: [Severity; 7] = [
        Severity::Low,
        Severity::Optimal,
        Severity::Normal,
        Severity::NormalHigh,
        Severity::High1,
        Severity::High2,
        Severity::High3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Optimal => "OPTIMAL",
            Severity::Normal => "NORMAL",
            Severity::NormalHigh => "NORMAL_HIGH",
            Severity::High1 => "HIGH1",
            Severity::High2 => "HIGH2",
            Severity::High3 => "HIGH3",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "LOW" => Some(Severity::Low),
            "OPTIMAL" => Some(Severity::Optimal),
            "NORMAL" => Some(Severity::Normal),
            "NORMAL_HIGH" | "HIGH_NORMAL" => Some(Severity::NormalHigh),
            "HIGH1" => Some(Severity::High1),
            "HIGH2" => Some(Severity::High2),
            "HIGH3" => Some(Severity::High3),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Optimal => "Optimal",
            Severity::Normal => "Normal",
            Severity::NormalHigh => "High-Normal",
            Severity::High1 => "Hypertension Level 1",
            Severity::High2 => "Hypertension Level 2",
            Severity::High3 => "Hypertension Level 3",
        }
    }

    /// Report colour (RGB 0-255)
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Severity::Low => (0, 112, 192),
            Severity::Optimal | Severity::Normal => (0, 176, 80),
            Severity::NormalHigh => (255, 165, 0),
            Severity::High1 => (255, 0, 0),
            Severity::High2 | Severity::High3 => (192, 0, 0),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_severity_order() {
        for pair in Severity::ALL.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should be below {:?}", pair[0], pair[1]);
        }
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::High3));
    }

    #[test]
    fn test_from_str_round_trips_names() {
        for severity in Severity::ALL {
            assert_eq!(Severity::from_str(severity.as_str()), Some(severity));
        }
        assert_eq!(Severity::from_str("high-normal"), Some(Severity::NormalHigh));
        assert_eq!(Severity::from_str("severe"), None);
    }
}
