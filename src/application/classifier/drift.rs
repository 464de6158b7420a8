//! Semantic drift checks between two markets.
//!
//! Each failed check adds a fixed weight to the risk score:
//!
//! | Check | Fails when | Weight |
//! |---|---|---|
//! | question text | similarity < 0.90 | 0.30 |
//! | resolution criteria | similarity < 0.95 | 0.25 |
//! | resolution date | both known and on different days | 0.20 |
//! | resolution source | both known and not equivalent | 0.20 |

use crate::domain::{DriftAssessment, DriftRisk, Market};

const TEXT_SIMILARITY_FLOOR: f64 = 0.90;
const CRITERIA_SIMILARITY_FLOOR: f64 = 0.95;
/// Criteria similarity reported when either market has none.
const UNKNOWN_CRITERIA_SIMILARITY: f64 = 0.5;

/// Source names that resolve identically.
const EQUIVALENT_SOURCES: &[&[&str]] = &[
    &["ap", "ap news", "associated press"],
    &["reuters", "reuters news"],
    &["bloomberg", "bloomberg terminal"],
];

/// Assess drift for a pair given precomputed embedding similarities.
///
/// `criteria_similarity` is `None` when either market lacks written criteria;
/// that case is reported but not penalized.
#[must_use]
pub fn assess(
    a: &Market,
    b: &Market,
    text_similarity: f64,
    criteria_similarity: Option<f64>,
) -> DriftAssessment {
    let mut score = 0.0;
    let mut issues = Vec::new();

    if text_similarity < TEXT_SIMILARITY_FLOOR {
        score += 0.3;
        issues.push(format!("low question similarity ({text_similarity:.2})"));
    }

    let criteria = match criteria_similarity {
        Some(sim) => {
            if sim < CRITERIA_SIMILARITY_FLOOR {
                score += 0.25;
                issues.push(format!("low resolution criteria similarity ({sim:.2})"));
            }
            sim
        }
        None => UNKNOWN_CRITERIA_SIMILARITY,
    };

    let dates_match = match (a.resolution_date(), b.resolution_date()) {
        (Some(x), Some(y)) if x.date_naive() != y.date_naive() => {
            score += 0.2;
            issues.push(format!(
                "different resolution dates: {} vs {}",
                x.date_naive(),
                y.date_naive()
            ));
            false
        }
        _ => true,
    };

    let sources_match = match (a.resolution_source(), b.resolution_source()) {
        (Some(x), Some(y)) if !sources_equivalent(x, y) => {
            score += 0.2;
            issues.push(format!("different resolution sources: {x} vs {y}"));
            false
        }
        _ => true,
    };

    DriftAssessment {
        text_similarity,
        criteria_similarity: criteria,
        dates_match,
        sources_match,
        score,
        risk: DriftRisk::from_score(score),
        issues,
    }
}

/// Case-insensitive source comparison with known aliases.
#[must_use]
pub fn sources_equivalent(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return true;
    }
    EQUIVALENT_SOURCES
        .iter()
        .any(|group| group.contains(&a.as_str()) && group.contains(&b.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Venue;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn market(id: &str) -> Market {
        Market::try_new(id, Venue::new("polymarket"), "q", dec!(0.5), dec!(0.5)).unwrap()
    }

    #[test]
    fn identical_markets_are_safe() {
        let d = assess(&market("a"), &market("b"), 0.97, Some(0.99));
        assert_eq!(d.risk, DriftRisk::Safe);
        assert!(d.issues.is_empty());
    }

    #[test]
    fn missing_criteria_is_not_penalized() {
        let d = assess(&market("a"), &market("b"), 0.95, None);
        assert_eq!(d.score, 0.0);
        assert_eq!(d.criteria_similarity, 0.5);
    }

    #[test]
    fn failures_accumulate() {
        let a = market("a")
            .with_resolution_source("Fox News")
            .with_resolution_date(Utc.with_ymd_and_hms(2026, 1, 20, 0, 0, 0).unwrap());
        let b = market("b")
            .with_resolution_source("CNN")
            .with_resolution_date(Utc.with_ymd_and_hms(2026, 1, 6, 0, 0, 0).unwrap());

        let d = assess(&a, &b, 0.80, Some(0.70));

        assert!((d.score - 0.95).abs() < 1e-9);
        assert_eq!(d.risk, DriftRisk::Critical);
        assert!(!d.dates_match);
        assert!(!d.sources_match);
        assert_eq!(d.issues.len(), 4);
    }

    #[test]
    fn source_aliases_are_equivalent() {
        assert!(sources_equivalent("AP News", "Associated Press"));
        assert!(sources_equivalent(" reuters ", "Reuters News"));
        assert!(sources_equivalent("Bloomberg", "bloomberg terminal"));
        assert!(!sources_equivalent("AP", "Reuters"));
    }
}
