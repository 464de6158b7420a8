//! Builders for domain primitives used across tests.
//!
//! Concise factories for [`Market`], [`OrderbookSnapshot`] and
//! [`Opportunity`] so tests focus on assertions rather than construction.

use rust_decimal::Decimal;

use crate::domain::{
    Leg, Market, Opportunity, OrderSide, OrderbookSnapshot, Outcome, PriceLevel,
    RebalanceDirection, RelationKind, Relationship, Venue,
};

/// A polymarket market with the given YES and NO prices.
///
/// # Panics
///
/// Panics if a price is outside `[0, 1]`.
pub fn make_market(id: &str, yes: Decimal, no: Decimal) -> Market {
    Market::try_new(id, Venue::new("polymarket"), format!("{id}?"), yes, no)
        .expect("test prices are valid")
}

/// Like [`make_market`], with per-outcome dollar liquidity.
///
/// # Panics
///
/// Panics on invalid prices or negative liquidity.
pub fn make_liquid_market(id: &str, yes: Decimal, no: Decimal, liquidity: Decimal) -> Market {
    make_market(id, yes, no)
        .with_liquidity(liquidity, liquidity)
        .expect("test liquidity is valid")
}

/// An ask-side book from `(price, size)` pairs, best first.
pub fn make_book(market: &Market, outcome: Outcome, asks: &[(Decimal, Decimal)]) -> OrderbookSnapshot {
    let levels = asks
        .iter()
        .map(|&(price, size)| PriceLevel::new(price, size))
        .collect();
    OrderbookSnapshot::new(market.id().clone(), outcome, Vec::new(), levels)
}

/// Split or merge opportunity on `market`, whichever its prices imply.
pub fn rebalancing_opportunity(market: &Market) -> Opportunity {
    let deviation = market.yes_price() + market.no_price() - Decimal::ONE;
    let direction = if deviation < Decimal::ZERO {
        RebalanceDirection::Split
    } else {
        RebalanceDirection::Merge
    };
    Opportunity::rebalancing(market, deviation, direction)
}

/// Buy-NO-on-both opportunity across a mutually exclusive pair.
pub fn exclusive_pair_opportunity(a: &Market, b: &Market) -> Opportunity {
    let relationship = Relationship::new(
        a.id().clone(),
        b.id().clone(),
        RelationKind::MutuallyExclusive,
        0.9,
        "test",
    );
    let mispricing = a.yes_price() + b.yes_price() - Decimal::ONE;
    let legs = vec![
        Leg::from_market(a, Outcome::No, OrderSide::Buy),
        Leg::from_market(b, Outcome::No, OrderSide::Buy),
    ];
    Opportunity::combinatorial(a, b, relationship, mispricing, legs)
}
