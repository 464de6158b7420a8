//! Realized P&L from confirmed fills.
//!
//! Every basket pays exactly one dollar per hedged share at resolution in
//! the worst case, so a completed execution has locked in its P&L the moment
//! both legs fill. Quoted prices never enter the calculation.

use rust_decimal::Decimal;

use crate::application::profitability::{NetworkCostConfig, VenueFees};
use crate::domain::{Execution, Order, OrderSide, Usd};

/// Locked-in P&L of an execution's hedged quantity.
///
/// Cash flows come from actual fill notionals. Venue fees are charged on
/// each leg's fill notional at its average fill price; the network cost is
/// charged once when any leg settles on chain. Quantity on leg 1 beyond the
/// hedged amount is legging exposure and is not valued here.
#[must_use]
pub fn realized_pnl(execution: &Execution, fees: &VenueFees, network: &NetworkCostConfig) -> Usd {
    let legs = [execution.leg1(), execution.leg2()];
    let hedged = execution
        .leg1()
        .filled_size()
        .min(execution.leg2().filled_size());
    if hedged <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let cash: Usd = legs.iter().map(|leg| signed_cash(leg, hedged)).sum();
    let settlement = match execution.leg1().side() {
        OrderSide::Buy => hedged,
        OrderSide::Sell => -hedged,
    };
    let venue_fees: Usd = legs.iter().map(|leg| leg_fee(leg, hedged, fees)).sum();
    let network_cost = if legs.iter().any(|leg| network.is_on_chain(leg.venue())) {
        network.cost_usd()
    } else {
        Decimal::ZERO
    };

    cash + settlement - venue_fees - network_cost
}

/// Cash paid (negative) or received for `hedged` shares at the average fill.
fn signed_cash(leg: &Order, hedged: Decimal) -> Usd {
    let notional = leg.average_fill_price().unwrap_or(Decimal::ZERO) * hedged;
    match leg.side() {
        OrderSide::Buy => -notional,
        OrderSide::Sell => notional,
    }
}

fn leg_fee(leg: &Order, hedged: Decimal, fees: &VenueFees) -> Usd {
    let Some(price) = leg.average_fill_price() else {
        return Decimal::ZERO;
    };
    fees.fee(leg.venue(), leg.side(), price, price * hedged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::profitability::FeeSchedule;
    use crate::domain::{Fill, MarketId, OpportunityId, OrderId, Outcome, StrategyKind, Venue};
    use rust_decimal_macros::dec;

    fn order(side: OrderSide, price: Decimal, size: Decimal) -> Order {
        Order::try_new(
            MarketId::new("m"),
            Venue::new("kalshi"),
            Outcome::Yes,
            side,
            price,
            size,
        )
        .unwrap()
    }

    fn filled(side: OrderSide, fills: [(Decimal, Decimal); 2]) -> Execution {
        let mut exec = Execution::new(
            OpportunityId::from("opp"),
            StrategyKind::Rebalancing,
            order(side, fills[0].0, fills[0].1),
            order(side, fills[1].0, fills[1].1),
        );
        exec.leg1_mut()
            .apply_fill(&Fill::new(OrderId::new("a"), fills[0].0, fills[0].1));
        exec.leg2_mut()
            .apply_fill(&Fill::new(OrderId::new("b"), fills[1].0, fills[1].1));
        exec
    }

    fn no_fees() -> VenueFees {
        VenueFees::default().with("kalshi", FeeSchedule::flat(Decimal::ZERO))
    }

    #[test]
    fn split_basket_earns_the_discount() {
        let exec = filled(OrderSide::Buy, [(dec!(0.46), dec!(100)), (dec!(0.46), dec!(100))]);
        let pnl = realized_pnl(&exec, &no_fees(), &NetworkCostConfig::default());
        assert_eq!(pnl, dec!(8));
    }

    #[test]
    fn merge_basket_earns_the_premium() {
        let exec = filled(OrderSide::Sell, [(dec!(0.55), dec!(10)), (dec!(0.50), dec!(10))]);
        let pnl = realized_pnl(&exec, &no_fees(), &NetworkCostConfig::default());
        assert_eq!(pnl, dec!(0.5));
    }

    #[test]
    fn uses_fill_prices_not_limits() {
        let mut exec = Execution::new(
            OpportunityId::from("opp"),
            StrategyKind::Rebalancing,
            order(OrderSide::Buy, dec!(0.47), dec!(10)),
            order(OrderSide::Buy, dec!(0.47), dec!(10)),
        );
        exec.leg1_mut()
            .apply_fill(&Fill::new(OrderId::new("a"), dec!(0.45), dec!(10)));
        exec.leg2_mut()
            .apply_fill(&Fill::new(OrderId::new("b"), dec!(0.47), dec!(10)));

        let pnl = realized_pnl(&exec, &no_fees(), &NetworkCostConfig::default());
        assert_eq!(pnl, dec!(0.8));
    }

    #[test]
    fn charges_fees_and_gas() {
        let exec = filled(OrderSide::Buy, [(dec!(0.46), dec!(100)), (dec!(0.46), dec!(100))]);
        let fees = VenueFees::default().with("kalshi", FeeSchedule::flat(dec!(0.02)));
        let network = NetworkCostConfig {
            on_chain_venues: vec!["kalshi".into()],
            gas_units: 500_000,
            gas_price_gwei: dec!(1000),
            native_usd: Decimal::ONE,
        };

        // 8 - 2% of 92 - 0.5
        assert_eq!(realized_pnl(&exec, &fees, &network), dec!(5.66));
    }

    #[test]
    fn unhedged_quantity_is_not_valued() {
        let exec = filled(OrderSide::Buy, [(dec!(0.46), dec!(100)), (dec!(0.46), dec!(40))]);
        let pnl = realized_pnl(&exec, &no_fees(), &NetworkCostConfig::default());
        assert_eq!(pnl, dec!(3.2));
    }
}
