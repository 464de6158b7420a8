//! Logical relationships between pairs of markets.
//!
//! A [`Relationship`] is a pure function of the two markets it describes.
//! It is re-derived on every scan and never persisted as ground truth.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::MarketId;

/// Which way an implication runs between market A and market B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    AImpliesB,
    BImpliesA,
    Symmetric,
    None,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AImpliesB => "a_implies_b",
            Self::BImpliesA => "b_implies_a",
            Self::Symmetric => "symmetric",
            Self::None => "none",
        };
        write!(f, "{s}")
    }
}

/// The type of logical relationship between two markets.
///
/// Only entailment carries a payload; every other type has a fixed
/// direction implied by its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelationKind {
    /// At most one of the two can resolve YES.
    MutuallyExclusive,
    /// Exactly one of the two resolves YES.
    Complementary,
    /// No logical connection.
    Independent,
    /// One outcome guarantees the other.
    Entailment { direction: Direction },
    /// Both cannot be true, but the markets concern different events.
    Contradiction,
}

impl RelationKind {
    /// Stable snake_case name for logging and serialization.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::MutuallyExclusive => "mutually_exclusive",
            Self::Complementary => "complementary",
            Self::Independent => "independent",
            Self::Entailment { .. } => "entailment",
            Self::Contradiction => "contradiction",
        }
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        match self {
            Self::Entailment { direction } => *direction,
            Self::MutuallyExclusive | Self::Complementary | Self::Contradiction => {
                Direction::Symmetric
            }
            Self::Independent => Direction::None,
        }
    }

    /// Relationship types whose implied price identity can be traded.
    #[must_use]
    pub const fn is_tradeable(&self) -> bool {
        matches!(
            self,
            Self::MutuallyExclusive | Self::Complementary | Self::Entailment { .. }
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A classified relationship between market A and market B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub market_a: MarketId,
    pub market_b: MarketId,
    pub kind: RelationKind,
    /// Classification confidence in `[0, 1]`.
    pub confidence: f64,
    /// Short human-readable reason for the classification.
    pub reasoning: String,
    pub classified_at: DateTime<Utc>,
}

impl Relationship {
    /// Create a relationship, clamping confidence to `[0, 1]`.
    pub fn new(
        market_a: MarketId,
        market_b: MarketId,
        kind: RelationKind,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            market_a,
            market_b,
            kind,
            confidence,
            reasoning: reasoning.into(),
            classified_at: Utc::now(),
        }
    }

    /// The fail-closed result: no relationship is assumed without evidence.
    pub fn independent(market_a: MarketId, market_b: MarketId, reasoning: impl Into<String>) -> Self {
        Self::new(market_a, market_b, RelationKind::Independent, 0.0, reasoning)
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.kind.direction()
    }

    /// True when the relationship is tradeable with at least `min_confidence`.
    #[must_use]
    pub fn is_viable(&self, min_confidence: f64) -> bool {
        self.kind.is_tradeable() && self.confidence >= min_confidence
    }
}
