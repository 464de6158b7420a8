//! Net-of-cost profitability verdicts.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::id::{MarketId, OpportunityId};
use super::market::Outcome;
use super::money::Usd;

/// Itemized execution costs in dollars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub venue_fee: Usd,
    pub network: Usd,
    pub slippage: Usd,
}

impl CostBreakdown {
    #[must_use]
    pub fn total(&self) -> Usd {
        self.venue_fee + self.network + self.slippage
    }
}

/// Conditions that make a verdict less trustworthy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFactor {
    /// Slippage eats more than 30% of gross profit.
    SlippageDominant,
    /// Network cost eats more than 20% of gross profit.
    NetworkCostDominant,
    /// No orderbook for a leg; slippage was estimated conservatively.
    MissingOrderbook { market_id: MarketId, outcome: Outcome },
    /// Book depth or the slippage bound forced a smaller size.
    SizeCapped { requested: Usd, usable: Usd },
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlippageDominant => write!(f, "slippage exceeds 30% of gross profit"),
            Self::NetworkCostDominant => write!(f, "network cost exceeds 20% of gross profit"),
            Self::MissingOrderbook { market_id, outcome } => {
                write!(f, "no orderbook for {market_id} {outcome}")
            }
            Self::SizeCapped { requested, usable } => {
                write!(f, "size capped from ${requested} to ${usable}")
            }
        }
    }
}

/// Profitability of one opportunity at one size, valid for one decision cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitabilityAnalysis {
    pub opportunity_id: OpportunityId,
    /// Size requested by the caller.
    pub requested_size: Usd,
    /// Size the verdict applies to, at most `requested_size`.
    pub position_size: Usd,
    /// Per-share spread from quoted prices.
    pub gross_spread: Decimal,
    /// `gross_spread` times the shares `position_size` buys at the basket price.
    pub gross_profit: Usd,
    pub costs: CostBreakdown,
    pub net_profit: Usd,
    /// Net profit as a fraction of `position_size`.
    pub net_profit_pct: Decimal,
    /// Spread at which net profit is zero.
    pub break_even_spread: Decimal,
    /// Spread needed to clear the configured margin.
    pub min_required_spread: Decimal,
    pub is_profitable: bool,
    pub risk_factors: Vec<RiskFactor>,
}

impl ProfitabilityAnalysis {
    #[must_use]
    pub fn size_capped(&self) -> bool {
        self.position_size < self.requested_size
    }
}
