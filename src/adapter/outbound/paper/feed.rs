//! [`MarketFeed`] over a loaded scenario.

use std::sync::Arc;

use async_trait::async_trait;

use super::scenario::Scenario;
use crate::domain::{Market, MarketId, OrderbookSnapshot, Outcome};
use crate::error::Result;
use crate::port::MarketFeed;

/// Serves the scenario's markets and books unchanged on every call.
#[derive(Debug, Clone)]
pub struct PaperFeed {
    scenario: Arc<Scenario>,
}

impl PaperFeed {
    #[must_use]
    pub const fn new(scenario: Arc<Scenario>) -> Self {
        Self { scenario }
    }
}

#[async_trait]
impl MarketFeed for PaperFeed {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn markets(&self) -> Result<Vec<Market>> {
        Ok(self.scenario.markets().to_vec())
    }

    async fn orderbook(
        &self,
        market_id: &MarketId,
        outcome: Outcome,
    ) -> Result<Option<OrderbookSnapshot>> {
        Ok(self.scenario.book(market_id, outcome).cloned())
    }
}
