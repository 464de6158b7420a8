//! Cross-market combinatorial detection.
//!
//! Each tradeable relationship implies a price identity between two markets.
//! When prices violate it, a two-leg basket that pays at least one dollar in
//! every consistent world can be bought for less than a dollar:
//!
//! | Relationship | Violation | Basket |
//! |---|---|---|
//! | mutually exclusive | `yes_a + yes_b > 1` | NO a, NO b |
//! | complementary | `yes_a + yes_b < 1` | YES a, YES b |
//! | complementary | `yes_a + yes_b > 1` | NO a, NO b |
//! | a implies b | `yes_a > yes_b` | NO a, YES b |
//! | b implies a | `yes_b > yes_a` | YES a, NO b |
//! | equivalent | `yes_a != yes_b` | YES cheaper, NO dearer |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::opportunity::basket_edge;
use crate::domain::{
    Direction, DriftRisk, Leg, Market, Opportunity, OrderSide, Outcome, RelationKind,
    Relationship,
};
use crate::error::ConfigError;

/// Configuration for combinatorial detection.
#[derive(Debug, Clone, Deserialize)]
pub struct CombinatorialConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Minimum violation of the implied identity.
    #[serde(default = "default_min_mispricing")]
    pub min_mispricing: Decimal,
    /// Minimum relationship confidence.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Pairs at or above this drift level are skipped.
    #[serde(default = "default_max_drift")]
    pub max_drift: DriftRisk,
}

const fn default_enabled() -> bool {
    true
}

fn default_min_mispricing() -> Decimal {
    dec!(0.02)
}

const fn default_min_confidence() -> f64 {
    0.85
}

const fn default_max_drift() -> DriftRisk {
    DriftRisk::High
}

impl Default for CombinatorialConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_mispricing: default_min_mispricing(),
            min_confidence: default_min_confidence(),
            max_drift: default_max_drift(),
        }
    }
}

impl CombinatorialConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_mispricing <= Decimal::ZERO || self.min_mispricing >= Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "strategies.combinatorial.min_mispricing",
                reason: "must be in (0, 1)".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "strategies.combinatorial.min_confidence",
                reason: "must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

/// Detect a combinatorial opportunity for a classified pair.
#[must_use]
pub fn detect_combinatorial(
    a: &Market,
    b: &Market,
    relationship: &Relationship,
    config: &CombinatorialConfig,
) -> Option<Opportunity> {
    if !relationship.is_viable(config.min_confidence) || !a.is_quoted() || !b.is_quoted() {
        return None;
    }

    let (ya, yb) = (a.yes_price(), b.yes_price());
    let threshold = config.min_mispricing;
    let buy = |market: &Market, outcome| Leg::from_market(market, outcome, OrderSide::Buy);

    let (mispricing, legs) = match relationship.kind {
        RelationKind::MutuallyExclusive => {
            let excess = ya + yb - Decimal::ONE;
            (excess >= threshold).then(|| (excess, vec![buy(a, Outcome::No), buy(b, Outcome::No)]))?
        }
        RelationKind::Complementary => {
            let deviation = ya + yb - Decimal::ONE;
            if deviation.abs() < threshold {
                return None;
            }
            let outcome = if deviation < Decimal::ZERO {
                Outcome::Yes
            } else {
                Outcome::No
            };
            (deviation.abs(), vec![buy(a, outcome), buy(b, outcome)])
        }
        RelationKind::Entailment { direction } => match direction {
            Direction::AImpliesB => {
                let gap = ya - yb;
                (gap >= threshold)
                    .then(|| (gap, vec![buy(a, Outcome::No), buy(b, Outcome::Yes)]))?
            }
            Direction::BImpliesA => {
                let gap = yb - ya;
                (gap >= threshold)
                    .then(|| (gap, vec![buy(a, Outcome::Yes), buy(b, Outcome::No)]))?
            }
            Direction::Symmetric => {
                let gap = (ya - yb).abs();
                if gap < threshold {
                    return None;
                }
                let legs = if ya < yb {
                    vec![buy(a, Outcome::Yes), buy(b, Outcome::No)]
                } else {
                    vec![buy(a, Outcome::No), buy(b, Outcome::Yes)]
                };
                (gap, legs)
            }
            Direction::None => return None,
        },
        RelationKind::Independent | RelationKind::Contradiction => return None,
    };

    if legs.iter().any(|leg| leg.price <= Decimal::ZERO) || basket_edge(&legs) <= Decimal::ZERO {
        return None;
    }

    Some(Opportunity::combinatorial(
        a,
        b,
        relationship.clone(),
        mispricing,
        legs,
    ))
}
