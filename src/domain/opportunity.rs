//! Arbitrage opportunities.
//!
//! An [`Opportunity`] is a candidate trade emitted by a detector. It carries
//! the legs needed to lock in the mispricing and a `raw_spread` that is used
//! only for prioritization. Profitability and risk are decided downstream.
//!
//! Every opportunity is a basket of legs whose combined payoff is at least
//! one dollar per share at resolution: buy baskets cost less than a dollar,
//! sell baskets collect more than a dollar.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MarketId, OpportunityId};
use super::market::{Market, Outcome, Venue};
use super::money::{Price, Usd, Volume};
use super::order::OrderSide;
use super::relation::Relationship;

/// Which detector produced an opportunity.
///
/// Ordering is the ranking tie-break: rebalancing sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Rebalancing,
    Combinatorial,
}

impl StrategyKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rebalancing => "rebalancing",
            Self::Combinatorial => "combinatorial",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rebalancing trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceDirection {
    /// YES + NO < 1: buy both sides.
    Split,
    /// YES + NO > 1: sell both sides.
    Merge,
}

impl fmt::Display for RebalanceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Split => write!(f, "split"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// One order to place as part of an opportunity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leg {
    pub market_id: MarketId,
    pub venue: Venue,
    pub outcome: Outcome,
    pub side: OrderSide,
    /// Quoted price at detection time.
    pub price: Price,
    /// Dollar liquidity on this outcome at detection time.
    pub liquidity: Usd,
}

impl Leg {
    /// Build a leg at the market's quoted price for `outcome`.
    #[must_use]
    pub fn from_market(market: &Market, outcome: Outcome, side: OrderSide) -> Self {
        let quote = market.quote(outcome);
        Self {
            market_id: market.id().clone(),
            venue: market.venue().clone(),
            outcome,
            side,
            price: quote.price(),
            liquidity: quote.liquidity(),
        }
    }
}

/// Strategy-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum OpportunityKind {
    Rebalancing {
        market_id: MarketId,
        /// `yes + no - 1`.
        deviation: Decimal,
        direction: RebalanceDirection,
    },
    Combinatorial {
        market_a: MarketId,
        market_b: MarketId,
        relationship: Relationship,
        /// Violation of the relationship's implied price identity.
        mispricing: Decimal,
    },
}

/// A candidate arbitrage trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    id: OpportunityId,
    kind: OpportunityKind,
    legs: Vec<Leg>,
    raw_spread: Decimal,
    summary: String,
    detected_at: DateTime<Utc>,
}

impl Opportunity {
    /// Rebalancing opportunity on one market.
    #[must_use]
    pub fn rebalancing(market: &Market, deviation: Decimal, direction: RebalanceDirection) -> Self {
        let side = match direction {
            RebalanceDirection::Split => OrderSide::Buy,
            RebalanceDirection::Merge => OrderSide::Sell,
        };
        let legs = vec![
            Leg::from_market(market, Outcome::Yes, side),
            Leg::from_market(market, Outcome::No, side),
        ];
        Self {
            id: OpportunityId::for_market(market.id()),
            kind: OpportunityKind::Rebalancing {
                market_id: market.id().clone(),
                deviation,
                direction,
            },
            raw_spread: deviation.abs(),
            legs,
            summary: market.question().to_string(),
            detected_at: Utc::now(),
        }
    }

    /// Combinatorial opportunity across two related markets.
    ///
    /// `raw_spread` is the executable basket edge implied by `legs`, which can
    /// differ from `mispricing` when the NO quotes are not exact complements.
    #[must_use]
    pub fn combinatorial(
        a: &Market,
        b: &Market,
        relationship: Relationship,
        mispricing: Decimal,
        legs: Vec<Leg>,
    ) -> Self {
        let raw_spread = basket_edge(&legs);
        Self {
            id: OpportunityId::for_pair(a.id(), b.id()),
            kind: OpportunityKind::Combinatorial {
                market_a: a.id().clone(),
                market_b: b.id().clone(),
                relationship,
                mispricing,
            },
            legs,
            raw_spread,
            summary: format!("{} / {}", a.question(), b.question()),
            detected_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> &OpportunityId {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> &OpportunityKind {
        &self.kind
    }

    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        match self.kind {
            OpportunityKind::Rebalancing { .. } => StrategyKind::Rebalancing,
            OpportunityKind::Combinatorial { .. } => StrategyKind::Combinatorial,
        }
    }

    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Gross per-share spread before costs. Prioritization only.
    #[must_use]
    pub const fn raw_spread(&self) -> Decimal {
        self.raw_spread
    }

    #[must_use]
    pub fn summary(&self) -> &str {
        &self.summary
    }

    #[must_use]
    pub const fn detected_at(&self) -> DateTime<Utc> {
        self.detected_at
    }

    /// Distinct markets touched, in leg order.
    #[must_use]
    pub fn markets(&self) -> Vec<MarketId> {
        let mut seen = HashSet::new();
        self.legs
            .iter()
            .filter(|leg| seen.insert(&leg.market_id))
            .map(|leg| leg.market_id.clone())
            .collect()
    }

    /// Sum of quoted leg prices: the cost (or proceeds) of one share of the basket.
    #[must_use]
    pub fn basket_price(&self) -> Price {
        self.legs.iter().map(|leg| leg.price).sum()
    }

    /// Shares of the basket a dollar amount buys (or sells).
    #[must_use]
    pub fn shares_for(&self, size: Usd) -> Volume {
        let price = self.basket_price();
        if price.is_zero() {
            Decimal::ZERO
        } else {
            size / price
        }
    }

    /// Dollar notional allotted to each leg for a position of `size`, in leg order.
    #[must_use]
    pub fn leg_notionals(&self, size: Usd) -> Vec<Usd> {
        let price = self.basket_price();
        if price.is_zero() {
            return vec![Decimal::ZERO; self.legs.len()];
        }
        self.legs.iter().map(|leg| size * leg.price / price).collect()
    }

    /// Smallest liquidity across legs, the binding constraint on size.
    #[must_use]
    pub fn min_liquidity(&self) -> Usd {
        self.legs
            .iter()
            .map(|leg| leg.liquidity)
            .min()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Per-share edge of a basket paying one dollar at resolution.
#[must_use]
pub fn basket_edge(legs: &[Leg]) -> Decimal {
    let total: Decimal = legs.iter().map(|leg| leg.price).sum();
    if legs.iter().all(|leg| leg.side == OrderSide::Sell) && !legs.is_empty() {
        total - Decimal::ONE
    } else {
        Decimal::ONE - total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::relation::RelationKind;
    use rust_decimal_macros::dec;

    fn market(id: &str, yes: Decimal, no: Decimal) -> Market {
        Market::try_new(id, Venue::new("polymarket"), format!("{id}?"), yes, no)
            .unwrap()
            .with_liquidity(dec!(1000), dec!(400))
            .unwrap()
    }

    #[test]
    fn split_buys_both_sides() {
        let m = market("m", dec!(0.46), dec!(0.46));
        let opp = Opportunity::rebalancing(&m, dec!(-0.08), RebalanceDirection::Split);

        assert_eq!(opp.id().as_str(), "m");
        assert_eq!(opp.strategy(), StrategyKind::Rebalancing);
        assert_eq!(opp.raw_spread(), dec!(0.08));
        assert!(opp.legs().iter().all(|l| l.side == OrderSide::Buy));
        assert_eq!(opp.markets(), vec![MarketId::new("m")]);
    }

    #[test]
    fn merge_sells_both_sides() {
        let m = market("m", dec!(0.55), dec!(0.50));
        let opp = Opportunity::rebalancing(&m, dec!(0.05), RebalanceDirection::Merge);

        assert!(opp.legs().iter().all(|l| l.side == OrderSide::Sell));
        assert_eq!(basket_edge(opp.legs()), dec!(0.05));
    }

    #[test]
    fn leg_notionals_split_by_price() {
        let m = market("m", dec!(0.46), dec!(0.46));
        let opp = Opportunity::rebalancing(&m, dec!(-0.08), RebalanceDirection::Split);

        let notionals = opp.leg_notionals(dec!(100));
        assert_eq!(notionals.len(), 2);
        assert_eq!(notionals[0], notionals[1]);
        assert_eq!(notionals[0], dec!(50));
        assert_eq!(opp.min_liquidity(), dec!(400));
    }

    #[test]
    fn combinatorial_id_is_sorted_pair() {
        let a = market("zeta", dec!(0.55), dec!(0.45));
        let b = market("alpha", dec!(0.55), dec!(0.45));
        let rel = Relationship::new(
            a.id().clone(),
            b.id().clone(),
            RelationKind::MutuallyExclusive,
            0.9,
            "test",
        );
        let legs = vec![
            Leg::from_market(&a, Outcome::No, OrderSide::Buy),
            Leg::from_market(&b, Outcome::No, OrderSide::Buy),
        ];
        let opp = Opportunity::combinatorial(&a, &b, rel, dec!(0.10), legs);

        assert_eq!(opp.id().as_str(), "alpha+zeta");
        assert_eq!(opp.raw_spread(), dec!(0.10));
        assert_eq!(opp.strategy(), StrategyKind::Combinatorial);
        assert_eq!(opp.markets().len(), 2);
    }

    #[test]
    fn rebalancing_sorts_before_combinatorial() {
        assert!(StrategyKind::Rebalancing < StrategyKind::Combinatorial);
    }
}
