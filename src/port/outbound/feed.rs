//! Market data feed port.

use async_trait::async_trait;

use crate::domain::{MarketId, Market, OrderbookSnapshot, Outcome};
use crate::error::Result;

/// Source of market snapshots and orderbooks.
///
/// Implementations wrap venue REST/WebSocket clients. The core only ever
/// reads from a feed; refresh cadence is the caller's concern.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Feed name for logging.
    fn name(&self) -> &'static str;

    /// Current snapshot of every tracked market.
    async fn markets(&self) -> Result<Vec<Market>>;

    /// Orderbook for one outcome of one market, or `None` if the venue has none.
    async fn orderbook(&self, market_id: &MarketId, outcome: Outcome)
        -> Result<Option<OrderbookSnapshot>>;
}
