//! In-memory [`MarketFeed`].

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::{Market, MarketId, OrderbookSnapshot, Outcome};
use crate::error::{Error, Result};
use crate::port::MarketFeed;

/// Serves a fixed set of markets and books. Can be switched to failing.
#[derive(Default)]
pub struct StaticFeed {
    markets: Mutex<Vec<Market>>,
    books: HashMap<(MarketId, Outcome), OrderbookSnapshot>,
    fail: Mutex<bool>,
}

impl StaticFeed {
    pub fn new(markets: Vec<Market>) -> Self {
        Self {
            markets: Mutex::new(markets),
            ..Self::default()
        }
    }

    pub fn with_book(mut self, book: OrderbookSnapshot) -> Self {
        self.books
            .insert((book.market_id().clone(), book.outcome()), book);
        self
    }

    /// Replace the market snapshot served on the next call.
    pub fn set_markets(&self, markets: Vec<Market>) {
        *self.markets.lock() = markets;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock() = fail;
    }
}

#[async_trait]
impl MarketFeed for StaticFeed {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn markets(&self) -> Result<Vec<Market>> {
        if *self.fail.lock() {
            return Err(Error::Feed("scripted failure".into()));
        }
        Ok(self.markets.lock().clone())
    }

    async fn orderbook(
        &self,
        market_id: &MarketId,
        outcome: Outcome,
    ) -> Result<Option<OrderbookSnapshot>> {
        Ok(self.books.get(&(market_id.clone(), outcome)).cloned())
    }
}
