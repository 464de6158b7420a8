//! Point-in-time market state for replay.

use chrono::{DateTime, Utc};

use super::book::Books;
use super::market::Market;

/// Every market and book observed at one instant.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub at: DateTime<Utc>,
    pub markets: Vec<Market>,
    pub books: Books,
}

impl MarketSnapshot {
    #[must_use]
    pub fn new(at: DateTime<Utc>, markets: Vec<Market>, books: Books) -> Self {
        Self { at, markets, books }
    }
}

/// Order snapshots chronologically. Stable, so equal timestamps keep file order.
pub fn sort_chronologically(snapshots: &mut [MarketSnapshot]) {
    snapshots.sort_by_key(|s| s.at);
}
