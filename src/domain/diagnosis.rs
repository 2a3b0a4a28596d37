//! Diagnosis result types.
//!
//! Represents the output of the heart disease classifier and the text shown for it.

use serde::{Deserialize, Serialize};

/// Binary risk classification for heart disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Predicted label 0
    Low,
    /// Predicted label 1
    High,
}

impl RiskLevel {
    /// Map a classifier label to a risk level.
    #[must_use]
    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    /// Fixed advisory sentence for this level.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Low => "Great! Maintain a healthy lifestyle and regular checkups",
            Self::High => "Please consult a cardiologist for further medical evaluation.",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129), // Emerald (#10B981)
            Self::High => (244, 63, 94), // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Format a probability in `[0, 1]` as a percentage with two decimals.
#[must_use]
pub fn format_probability(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Result of one prediction request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Binary prediction (0 = low risk, 1 = high risk)
    pub prediction: u8,

    /// Probability of the positive class (0.0 to 1.0)
    pub probability: f64,

    /// Risk classification derived from `prediction`
    pub risk_level: RiskLevel,
}

impl Diagnosis {
    /// Create a diagnosis from a classifier label and positive-class probability.
    ///
    /// Returns `None` if the label is not 0 or 1.
    #[must_use]
    pub fn new(prediction: u8, probability: f64) -> Option<Self> {
        let risk_level = RiskLevel::from_label(prediction)?;
        Some(Self {
            prediction,
            probability,
            risk_level,
        })
    }

    #[must_use]
    pub fn probability_percent(&self) -> String {
        format_probability(self.probability)
    }

    /// Headline shown in the result block.
    #[must_use]
    pub fn headline(&self) -> String {
        match self.risk_level {
            RiskLevel::High => format!(
                "High Risk of Heart Disease! (Probability: {})",
                self.probability_percent()
            ),
            RiskLevel::Low => format!(
                "Low Risk of Heart Disease (Probability: {})",
                self.probability_percent()
            ),
        }
    }

    #[must_use]
    pub fn advice(&self) -> &'static str {
        self.risk_level.advice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_label() {
        assert_eq!(RiskLevel::from_label(0), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_label(1), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_label(2), None);
        assert!(Diagnosis::new(7, 0.5).is_none());
    }

    #[test]
    fn test_probability_formatting() {
        assert_eq!(format_probability(0.0), "0.00%");
        assert_eq!(format_probability(1.0), "100.00%");
        assert_eq!(format_probability(0.87654), "87.65%");
        assert_eq!(format_probability(0.5), "50.00%");
        assert_eq!(format_probability(0.123), "12.30%");
    }

    #[test]
    fn test_high_risk_branch() {
        let diagnosis = Diagnosis::new(1, 0.8123).expect("valid label");
        assert_eq!(diagnosis.risk_level, RiskLevel::High);
        assert_eq!(
            diagnosis.headline(),
            "High Risk of Heart Disease! (Probability: 81.23%)"
        );
        assert!(diagnosis.advice().contains("cardiologist"));
        assert!(!diagnosis.headline().contains("Low Risk"));
    }

    #[test]
    fn test_low_risk_branch_reports_positive_class_probability() {
        let diagnosis = Diagnosis::new(0, 0.2).expect("valid label");
        assert_eq!(diagnosis.risk_level, RiskLevel::Low);
        assert_eq!(
            diagnosis.headline(),
            "Low Risk of Heart Disease (Probability: 20.00%)"
        );
        assert!(diagnosis.advice().contains("healthy lifestyle"));
        assert!(!diagnosis.headline().contains("High Risk"));
    }
}
