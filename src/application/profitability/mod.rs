//! Net-of-cost profitability analysis.
//!
//! Turns an [`Opportunity`] plus the current books into a
//! [`ProfitabilityAnalysis`]. Costs are itemized as venue fees, one network
//! settlement charge and depth slippage. The usable size is capped so that
//! no leg walks its book beyond `max_slippage`.
//!
//! Analyses are never cached; books are assumed stale after one decision.

pub mod fee;
pub mod slippage;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    Books, CostBreakdown, Opportunity, ProfitabilityAnalysis, RiskFactor, Usd,
};
use crate::error::ConfigError;

pub use fee::{FeeSchedule, NetworkCostConfig, VenueFees};
pub use slippage::{max_notional_within, walk_book, SlippageEstimate};

/// Thresholds for the profitability verdict.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfitabilityConfig {
    /// Minimum net profit as a fraction of position size.
    #[serde(default = "default_min_margin")]
    pub min_margin: Decimal,
    /// Minimum gross spread; below this the mispricing is noise.
    #[serde(default = "default_min_deviation")]
    pub min_deviation: Decimal,
    /// Maximum average-price slippage per leg before size is capped.
    #[serde(default = "default_max_slippage")]
    pub max_slippage: Decimal,
    /// Smallest position worth trading, in USD.
    #[serde(default = "default_min_viable_size")]
    pub min_viable_size: Usd,
    /// Slippage assumed for legs without an orderbook.
    #[serde(default = "default_default_slippage")]
    pub default_slippage: Decimal,
}

fn default_min_margin() -> Decimal {
    dec!(0.025)
}

fn default_min_deviation() -> Decimal {
    dec!(0.02)
}

fn default_max_slippage() -> Decimal {
    dec!(0.02)
}

fn default_min_viable_size() -> Usd {
    dec!(10)
}

fn default_default_slippage() -> Decimal {
    dec!(0.005)
}

impl Default for ProfitabilityConfig {
    fn default() -> Self {
        Self {
            min_margin: default_min_margin(),
            min_deviation: default_min_deviation(),
            max_slippage: default_max_slippage(),
            min_viable_size: default_min_viable_size(),
            default_slippage: default_default_slippage(),
        }
    }
}

impl ProfitabilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions = [
            ("profitability.min_margin", self.min_margin),
            ("profitability.min_deviation", self.min_deviation),
            ("profitability.max_slippage", self.max_slippage),
            ("profitability.default_slippage", self.default_slippage),
        ];
        for (field, value) in fractions {
            if value < Decimal::ZERO || value >= Decimal::ONE {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be in [0, 1), got {value}"),
                });
            }
        }
        if self.min_viable_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "profitability.min_viable_size",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Stateless analyzer; safe to share across concurrent evaluations.
#[derive(Debug, Clone, Default)]
pub struct ProfitabilityAnalyzer {
    fees: VenueFees,
    network: NetworkCostConfig,
    config: ProfitabilityConfig,
}

impl ProfitabilityAnalyzer {
    #[must_use]
    pub const fn new(
        fees: VenueFees,
        network: NetworkCostConfig,
        config: ProfitabilityConfig,
    ) -> Self {
        Self {
            fees,
            network,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ProfitabilityConfig {
        &self.config
    }

    #[must_use]
    pub const fn fees(&self) -> &VenueFees {
        &self.fees
    }

    #[must_use]
    pub const fn network(&self) -> &NetworkCostConfig {
        &self.network
    }

    /// Analyze `opportunity` at up to `position_size` dollars.
    #[must_use]
    pub fn analyze(
        &self,
        opportunity: &Opportunity,
        books: &Books,
        position_size: Usd,
    ) -> ProfitabilityAnalysis {
        let requested = position_size.max(Decimal::ZERO);
        let usable = self.usable_size(opportunity, books, requested);
        let mut risk_factors = Vec::new();

        // Same share count the execution engine will order.
        let shares = opportunity
            .shares_for(usable)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);
        let gross_spread = opportunity.raw_spread();
        let gross_profit = gross_spread * shares;

        let mut costs = CostBreakdown::default();
        for leg in opportunity.legs() {
            let notional = leg.price * shares;
            costs.venue_fee += self.fees.fee(&leg.venue, leg.side, leg.price, notional);

            match books.get(&leg.market_id, leg.outcome) {
                Some(book) => {
                    costs.slippage += walk_book(book.levels_for(leg.side), notional)
                        .map_or(Decimal::ZERO, |est| est.slippage_usd);
                }
                None => {
                    costs.slippage += notional * self.config.default_slippage;
                    risk_factors.push(RiskFactor::MissingOrderbook {
                        market_id: leg.market_id.clone(),
                        outcome: leg.outcome,
                    });
                }
            }
        }
        if shares > Decimal::ZERO
            && opportunity
                .legs()
                .iter()
                .any(|leg| self.network.is_on_chain(&leg.venue))
        {
            costs.network = self.network.cost_usd();
        }

        let total_costs = costs.total();
        let net_profit = gross_profit - total_costs;
        let (net_profit_pct, break_even_spread) = if shares > Decimal::ZERO {
            (net_profit / usable, total_costs / shares)
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        // Per-share spread that clears `min_margin` on the dollars committed.
        let min_required_spread =
            break_even_spread + self.config.min_margin * opportunity.basket_price();

        if costs.slippage > gross_profit * dec!(0.3) {
            risk_factors.push(RiskFactor::SlippageDominant);
        }
        if costs.network > gross_profit * dec!(0.2) {
            risk_factors.push(RiskFactor::NetworkCostDominant);
        }
        if usable < requested {
            risk_factors.push(RiskFactor::SizeCapped {
                requested,
                usable,
            });
        }

        let is_profitable = usable >= self.config.min_viable_size
            && net_profit_pct >= self.config.min_margin
            && gross_spread >= self.config.min_deviation;

        debug!(
            opportunity_id = %opportunity.id(),
            size = %usable,
            shares = %shares,
            gross = %gross_profit,
            fees = %costs.venue_fee,
            network = %costs.network,
            slippage = %costs.slippage,
            net = %net_profit,
            is_profitable,
            "Profitability analyzed"
        );

        ProfitabilityAnalysis {
            opportunity_id: opportunity.id().clone(),
            requested_size: requested,
            position_size: usable,
            gross_spread,
            gross_profit,
            costs,
            net_profit,
            net_profit_pct,
            break_even_spread,
            min_required_spread,
            is_profitable,
            risk_factors,
        }
    }

    /// Largest size, up to `requested`, that keeps every booked leg within
    /// `max_slippage`. Rounded down to cents.
    fn usable_size(&self, opportunity: &Opportunity, books: &Books, requested: Usd) -> Usd {
        let basket = opportunity.basket_price();
        if basket <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let capped = opportunity
            .legs()
            .iter()
            .filter(|leg| leg.price > Decimal::ZERO)
            .filter_map(|leg| {
                let book = books.get(&leg.market_id, leg.outcome)?;
                let leg_cap =
                    max_notional_within(book.levels_for(leg.side), self.config.max_slippage, leg.side);
                Some(leg_cap * basket / leg.price)
            })
            .fold(requested, Decimal::min);

        capped
            .max(Decimal::ZERO)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero)
    }
}
