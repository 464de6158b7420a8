//! Semantic drift between apparently matching markets.
//!
//! Two questions can read alike yet resolve differently because of their
//! criteria, dates or sources. A [`DriftAssessment`] scores that risk.

use std::fmt;

use serde::Serialize;

/// Drift risk level, ordered from safest to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftRisk {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl DriftRisk {
    /// Level for an additive risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::Safe
        }
    }
}

impl fmt::Display for DriftRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Safe => "safe",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{s}")
    }
}

/// Outcome of a drift check on a market pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftAssessment {
    pub text_similarity: f64,
    pub criteria_similarity: f64,
    pub dates_match: bool,
    pub sources_match: bool,
    pub score: f64,
    pub risk: DriftRisk,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_thresholds() {
        assert_eq!(DriftRisk::from_score(0.0), DriftRisk::Safe);
        assert_eq!(DriftRisk::from_score(0.2), DriftRisk::Low);
        assert_eq!(DriftRisk::from_score(0.45), DriftRisk::Medium);
        assert_eq!(DriftRisk::from_score(0.75), DriftRisk::High);
        assert_eq!(DriftRisk::from_score(0.95), DriftRisk::Critical);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(DriftRisk::Safe < DriftRisk::High);
        assert!(DriftRisk::High < DriftRisk::Critical);
    }
}
