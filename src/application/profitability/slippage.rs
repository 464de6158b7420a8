//! Depth-aware slippage estimation.
//!
//! Levels are walked best-first. Sizes are in shares and notionals in USD,
//! so a level can absorb `price * size` dollars.

use rust_decimal::Decimal;

use crate::domain::{OrderSide, Price, PriceLevel, Usd};

/// Outcome of walking one side of a book for a given notional.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageEstimate {
    pub best_price: Price,
    pub average_price: Price,
    pub filled_notional: Usd,
    /// `|average - best| / best`.
    pub slippage_pct: Decimal,
    /// Dollars lost to depth versus filling everything at the best price.
    pub slippage_usd: Usd,
    pub fully_filled: bool,
}

/// Walk `levels` until `notional` dollars are spent or the book runs out.
///
/// Returns `None` for an empty book or a non-positive notional.
#[must_use]
pub fn walk_book(levels: &[PriceLevel], notional: Usd) -> Option<SlippageEstimate> {
    let best_price = levels.first()?.price();
    if notional <= Decimal::ZERO || best_price <= Decimal::ZERO {
        return None;
    }

    let mut remaining = notional;
    let mut shares = Decimal::ZERO;
    let mut spent = Decimal::ZERO;
    let mut slippage_usd = Decimal::ZERO;

    for level in levels {
        if remaining <= Decimal::ZERO {
            break;
        }
        if level.price() <= Decimal::ZERO {
            continue;
        }
        let take = remaining.min(level.price() * level.size());
        shares += take / level.price();
        spent += take;
        slippage_usd += take * (level.price() - best_price).abs() / level.price();
        remaining -= take;
    }

    if shares.is_zero() {
        return None;
    }

    let average_price = spent / shares;
    let slippage_pct = (average_price - best_price).abs() / best_price;
    Some(SlippageEstimate {
        best_price,
        average_price,
        filled_notional: spent,
        slippage_pct,
        slippage_usd,
        fully_filled: remaining <= Decimal::ZERO,
    })
}

/// Largest notional that keeps average execution within `max_slippage` of best.
///
/// Buys walk asks upward and may average at most `best * (1 + max_slippage)`;
/// sells walk bids downward and may average no less than `best * (1 - max_slippage)`.
/// The level that crosses the bound is taken partially.
#[must_use]
pub fn max_notional_within(levels: &[PriceLevel], max_slippage: Decimal, side: OrderSide) -> Usd {
    let Some(best) = levels.first().map(PriceLevel::price) else {
        return Decimal::ZERO;
    };
    let bound = match side {
        OrderSide::Buy => best * (Decimal::ONE + max_slippage),
        OrderSide::Sell => best * (Decimal::ONE - max_slippage),
    };

    let mut shares = Decimal::ZERO;
    let mut spent = Decimal::ZERO;

    for level in levels {
        let p = level.price();
        let within = match side {
            OrderSide::Buy => p <= bound,
            OrderSide::Sell => p >= bound,
        };
        if within {
            shares += level.size();
            spent += p * level.size();
            continue;
        }
        // Solve (spent + p*x) / (shares + x) = bound for x.
        let partial = ((bound * shares - spent) / (p - bound))
            .max(Decimal::ZERO)
            .min(level.size());
        spent += p * partial;
        break;
    }

    spent
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn asks() -> Vec<PriceLevel> {
        vec![
            PriceLevel::new(dec!(0.50), dec!(100)),
            PriceLevel::new(dec!(0.60), dec!(100)),
        ]
    }

    #[test]
    fn fill_within_best_level_has_no_slippage() {
        let est = walk_book(&asks(), dec!(25)).unwrap();
        assert_eq!(est.average_price, dec!(0.50));
        assert_eq!(est.slippage_pct, Decimal::ZERO);
        assert_eq!(est.slippage_usd, Decimal::ZERO);
        assert!(est.fully_filled);
    }

    #[test]
    fn walking_depth_raises_average_price() {
        // $50 at 0.50 (100 shares) + $30 at 0.60 (50 shares) = $80 for 150 shares.
        let est = walk_book(&asks(), dec!(80)).unwrap();
        assert_eq!(est.filled_notional, dec!(80));
        assert!((est.average_price - dec!(0.5333)).abs() < dec!(0.0001));
        assert_eq!(est.slippage_usd, dec!(5));
    }

    #[test]
    fn thin_book_is_partially_filled() {
        let est = walk_book(&asks(), dec!(500)).unwrap();
        assert!(!est.fully_filled);
        assert_eq!(est.filled_notional, dec!(110));
    }

    #[test]
    fn empty_book_has_no_estimate() {
        assert!(walk_book(&[], dec!(10)).is_none());
        assert!(walk_book(&asks(), Decimal::ZERO).is_none());
    }

    #[test]
    fn max_notional_takes_crossing_level_partially() {
        // Bound 0.55: 100 shares at 0.50 plus x at 0.60 where (50 + 0.6x)/(100 + x) = 0.55.
        let notional = max_notional_within(&asks(), dec!(0.10), OrderSide::Buy);
        assert_eq!(notional, dec!(110));
        let est = walk_book(&asks(), notional).unwrap();
        assert!(est.slippage_pct <= dec!(0.10));
    }

    #[test]
    fn max_notional_for_sells_walks_down() {
        let bids = vec![
            PriceLevel::new(dec!(0.50), dec!(100)),
            PriceLevel::new(dec!(0.40), dec!(100)),
        ];
        // Bound 0.45: (50 + 0.4x)/(100 + x) = 0.45 gives x = 100.
        let notional = max_notional_within(&bids, dec!(0.10), OrderSide::Sell);
        assert_eq!(notional, dec!(90));
    }

    #[test]
    fn tight_bound_stops_at_best_level() {
        let notional = max_notional_within(&asks(), Decimal::ZERO, OrderSide::Buy);
        assert_eq!(notional, dec!(50));
    }
}
