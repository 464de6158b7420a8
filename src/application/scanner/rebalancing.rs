//! Intra-market rebalancing detection.
//!
//! A binary market's YES and NO prices should sum to one. When they sum
//! below one, buying both sides (split) locks in the difference; when they
//! sum above one, selling both sides (merge) does.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::{Market, Opportunity, RebalanceDirection};
use crate::error::ConfigError;

/// Configuration for rebalancing detection.
#[derive(Debug, Clone, Deserialize)]
pub struct RebalancingConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Minimum `|yes + no - 1|` to report.
    #[serde(default = "default_min_deviation")]
    pub min_deviation: Decimal,
}

const fn default_enabled() -> bool {
    true
}

fn default_min_deviation() -> Decimal {
    dec!(0.02)
}

impl Default for RebalancingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            min_deviation: default_min_deviation(),
        }
    }
}

impl RebalancingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_deviation <= Decimal::ZERO || self.min_deviation >= Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "strategies.rebalancing.min_deviation",
                reason: "must be in (0, 1)".into(),
            });
        }
        Ok(())
    }
}

/// Detect a rebalancing opportunity in one market.
///
/// Fires iff `|yes + no - 1| >= min_deviation`. Markets missing a quote on
/// either side are skipped.
#[must_use]
pub fn detect_rebalancing(market: &Market, config: &RebalancingConfig) -> Option<Opportunity> {
    if !market.is_quoted() {
        return None;
    }

    let deviation = market.yes_price() + market.no_price() - Decimal::ONE;
    if deviation.abs() < config.min_deviation {
        return None;
    }

    let direction = if deviation < Decimal::ZERO {
        RebalanceDirection::Split
    } else {
        RebalanceDirection::Merge
    };
    Some(Opportunity::rebalancing(market, deviation, direction))
}
