//! Resolution-date proximity filter.

use chrono::{DateTime, Utc};

/// How close two markets resolve in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalProximity {
    /// Whole days between resolution dates, if both are known.
    pub days_apart: Option<i64>,
    /// Within the configured threshold.
    pub is_proximate: bool,
    /// 1.0 on the same day, falling linearly to 0.0 at the threshold.
    pub score: f64,
}

/// Compare two resolution dates against `threshold_days`.
///
/// Markets with an unknown resolution date are never proximate.
#[must_use]
pub fn proximity(
    a: Option<DateTime<Utc>>,
    b: Option<DateTime<Utc>>,
    threshold_days: i64,
) -> TemporalProximity {
    let (Some(a), Some(b)) = (a, b) else {
        return TemporalProximity {
            days_apart: None,
            is_proximate: false,
            score: 0.0,
        };
    };

    let days = (b - a).num_days().abs();
    let is_proximate = days <= threshold_days;
    let score = if threshold_days <= 0 {
        if days == 0 {
            1.0
        } else {
            0.0
        }
    } else {
        (1.0 - days as f64 / threshold_days as f64).max(0.0)
    };

    TemporalProximity {
        days_apart: Some(days),
        is_proximate,
        score,
    }
}
