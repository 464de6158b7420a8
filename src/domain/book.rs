//! Orderbook snapshots for depth-aware slippage estimation.
//!
//! - [`PriceLevel`] - A single price level with size
//! - [`OrderbookSnapshot`] - Both sides of the book for one market outcome
//! - [`Books`] - Snapshots for one decision cycle, keyed by market and outcome
//!
//! Snapshots are never mutated after creation. Bids are held best-first
//! (descending), asks best-first (ascending), regardless of the order the
//! feed delivered them in.
//!
//! # Examples
//!
//! ```
//! use arbiter::domain::book::{OrderbookSnapshot, PriceLevel};
//! use arbiter::domain::market::Outcome;
//! use rust_decimal_macros::dec;
//!
//! let book = OrderbookSnapshot::new(
//!     "m-1",
//!     Outcome::Yes,
//!     vec![PriceLevel::new(dec!(0.44), dec!(200)), PriceLevel::new(dec!(0.45), dec!(100))],
//!     vec![PriceLevel::new(dec!(0.47), dec!(300)), PriceLevel::new(dec!(0.46), dec!(150))],
//! );
//!
//! assert_eq!(book.best_bid().unwrap().price(), dec!(0.45));
//! assert_eq!(book.best_ask().unwrap().price(), dec!(0.46));
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::id::MarketId;
use super::market::Outcome;
use super::money::{Price, Volume};
use super::order::OrderSide;

/// A single price level in an order book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    price: Price,
    size: Volume,
}

impl PriceLevel {
    /// Creates a new price level.
    #[must_use]
    pub const fn new(price: Price, size: Volume) -> Self {
        Self { price, size }
    }

    /// Returns the price at this level.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Returns the contract quantity available at this level.
    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }
}

/// Orderbook for one outcome of one market.
#[derive(Debug, Clone)]
pub struct OrderbookSnapshot {
    market_id: MarketId,
    outcome: Outcome,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    captured_at: DateTime<Utc>,
}

impl OrderbookSnapshot {
    /// Build a snapshot, sorting both sides best-first.
    pub fn new(
        market_id: impl Into<MarketId>,
        outcome: Outcome,
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            market_id: market_id.into(),
            outcome,
            bids,
            asks,
            captured_at: Utc::now(),
        }
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    #[must_use]
    pub const fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Levels an order on `side` consumes: buys lift asks, sells hit bids.
    #[must_use]
    pub fn levels_for(&self, side: OrderSide) -> &[PriceLevel] {
        match side {
            OrderSide::Buy => &self.asks,
            OrderSide::Sell => &self.bids,
        }
    }
}

/// Orderbook snapshots for one decision cycle.
#[derive(Debug, Clone, Default)]
pub struct Books {
    books: HashMap<(MarketId, Outcome), OrderbookSnapshot>,
}

impl Books {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a snapshot, replacing any previous one for the same market outcome.
    pub fn insert(&mut self, book: OrderbookSnapshot) {
        self.books
            .insert((book.market_id.clone(), book.outcome), book);
    }

    #[must_use]
    pub fn get(&self, market_id: &MarketId, outcome: Outcome) -> Option<&OrderbookSnapshot> {
        self.books.get(&(market_id.clone(), outcome))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl FromIterator<OrderbookSnapshot> for Books {
    fn from_iter<I: IntoIterator<Item = OrderbookSnapshot>>(iter: I) -> Self {
        let mut books = Self::new();
        for book in iter {
            books.insert(book);
        }
        books
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book() -> OrderbookSnapshot {
        OrderbookSnapshot::new(
            "m-1",
            Outcome::No,
            vec![
                PriceLevel::new(dec!(0.40), dec!(10)),
                PriceLevel::new(dec!(0.42), dec!(20)),
            ],
            vec![
                PriceLevel::new(dec!(0.50), dec!(10)),
                PriceLevel::new(dec!(0.48), dec!(20)),
            ],
        )
    }

    #[test]
    fn sides_are_sorted_best_first() {
        let b = book();
        assert_eq!(b.best_bid().unwrap().price(), dec!(0.42));
        assert_eq!(b.best_ask().unwrap().price(), dec!(0.48));
        assert_eq!(b.asks()[1].price(), dec!(0.50));
    }

    #[test]
    fn buy_walks_asks_and_sell_walks_bids() {
        let b = book();
        assert_eq!(b.levels_for(OrderSide::Buy)[0].price(), dec!(0.48));
        assert_eq!(b.levels_for(OrderSide::Sell)[0].price(), dec!(0.42));
    }

    #[test]
    fn books_are_keyed_by_market_and_outcome() {
        let books: Books = vec![book()].into_iter().collect();

        assert!(books.get(&MarketId::new("m-1"), Outcome::No).is_some());
        assert!(books.get(&MarketId::new("m-1"), Outcome::Yes).is_none());
        assert_eq!(books.len(), 1);
    }
}
