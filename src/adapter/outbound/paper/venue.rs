//! Simulated order execution.
//!
//! Orders whose limit crosses the scenario quote fill in full at the quote
//! after the configured latency, with the configured probability. Orders
//! that do not fill rest until cancelled. A cancel that races a pending
//! fill is resolved by whichever removes the resting order first; a filled
//! order refuses later cancels. Closed orders stay queryable for
//! `closed_retention_secs`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, info};

use super::scenario::Scenario;
use super::settings::PaperConfig;
use crate::domain::{Fill, Order, OrderId, OrderSide, Price, Volume};
use crate::error::VenueError;
use crate::port::{OrderClient, OrderStatusReport, OrderUpdate};

#[derive(Debug, Clone, Copy)]
struct Resting {
    price: Price,
    size: Volume,
}

/// A filled or cancelled order.
#[derive(Debug, Clone, Copy)]
struct Closed {
    filled: Volume,
    price: Option<Price>,
    at: Instant,
}

impl Closed {
    fn filled(order: Resting) -> Self {
        Self {
            filled: order.size,
            price: Some(order.price),
            at: Instant::now(),
        }
    }

    fn cancelled() -> Self {
        Self {
            filled: Decimal::ZERO,
            price: None,
            at: Instant::now(),
        }
    }
}

/// Paper trading venue.
pub struct PaperVenue {
    scenario: Arc<Scenario>,
    fill_probability: f64,
    latency: Duration,
    rng: Mutex<StdRng>,
    resting: Arc<DashMap<OrderId, Resting>>,
    closed: Arc<DashMap<OrderId, Closed>>,
    retention: Duration,
    updates: broadcast::Sender<OrderUpdate>,
    next_id: AtomicU64,
}

impl PaperVenue {
    #[must_use]
    pub fn new(scenario: Arc<Scenario>, config: &PaperConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let (updates, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            scenario,
            fill_probability: config.fill_probability.clamp(0.0, 1.0),
            latency: Duration::from_millis(config.latency_ms),
            rng: Mutex::new(rng),
            resting: Arc::new(DashMap::new()),
            closed: Arc::new(DashMap::new()),
            retention: Duration::from_secs(config.closed_retention_secs),
            updates,
            next_id: AtomicU64::new(1),
        }
    }

    /// Orders accepted and neither filled nor cancelled.
    #[must_use]
    pub fn resting_orders(&self) -> usize {
        self.resting.len()
    }

    /// Filled or cancelled orders still retained for status queries.
    #[must_use]
    pub fn closed_orders(&self) -> usize {
        self.closed.len()
    }

    fn prune_closed(&self) {
        let retention = self.retention;
        self.closed.retain(|_, closed| closed.at.elapsed() < retention);
    }

    /// Execution price if the order's limit crosses the quote.
    fn crossing_price(&self, order: &Order) -> Option<Price> {
        let limit = order.limit_price();
        let Some(quote) = self.scenario.quote(order.market_id(), order.outcome()) else {
            return Some(limit);
        };
        match order.side() {
            OrderSide::Buy => (quote <= limit).then_some(quote),
            OrderSide::Sell => (quote >= limit).then_some(quote),
        }
    }

    fn schedule_fill(&self, id: OrderId) {
        let resting = Arc::clone(&self.resting);
        let closed = Arc::clone(&self.closed);
        let tx = self.updates.clone();
        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            if let Some((id, order)) = resting.remove(&id) {
                closed.insert(id.clone(), Closed::filled(order));
                debug!(order_id = %id, price = %order.price, size = %order.size, "Paper fill");
                let _ = tx.send(OrderUpdate::Filled(Fill::new(id, order.price, order.size)));
            }
        });
    }
}

#[async_trait]
impl OrderClient for PaperVenue {
    fn name(&self) -> &'static str {
        "paper"
    }

    async fn submit(&self, order: &Order) -> Result<OrderId, VenueError> {
        self.prune_closed();
        let id = OrderId::new(format!(
            "paper-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ));
        let crossing = self.crossing_price(order);
        let fills = crossing.is_some() && self.rng.lock().gen_bool(self.fill_probability);

        self.resting.insert(
            id.clone(),
            Resting {
                price: crossing.unwrap_or(order.limit_price()),
                size: order.size(),
            },
        );
        info!(
            order_id = %id,
            market_id = %order.market_id(),
            outcome = %order.outcome(),
            side = %order.side(),
            limit = %order.limit_price(),
            size = %order.size(),
            fills,
            "Paper order accepted"
        );

        if fills {
            self.schedule_fill(id.clone());
        }
        Ok(id)
    }

    async fn cancel(&self, order_id: &OrderId) -> Result<(), VenueError> {
        if self.resting.remove(order_id).is_some() {
            self.closed.insert(order_id.clone(), Closed::cancelled());
        } else {
            match self.closed.get(order_id).map(|closed| closed.filled) {
                Some(filled) if filled > Decimal::ZERO => {
                    debug!(order_id = %order_id, "Paper cancel refused, order filled");
                    return Err(VenueError::AlreadyFilled {
                        order_id: order_id.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    return Err(VenueError::UnknownOrder {
                        order_id: order_id.to_string(),
                    })
                }
            }
        }
        debug!(order_id = %order_id, "Paper cancel acknowledged");
        let _ = self.updates.send(OrderUpdate::CancelAcknowledged {
            order_id: order_id.clone(),
        });
        Ok(())
    }

    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusReport, VenueError> {
        if self.resting.contains_key(order_id) {
            return Ok(OrderStatusReport {
                filled: Decimal::ZERO,
                average_price: None,
                open: true,
            });
        }
        self.closed
            .get(order_id)
            .map(|closed| OrderStatusReport {
                filled: closed.filled,
                average_price: closed.price,
                open: false,
            })
            .ok_or_else(|| VenueError::UnknownOrder {
                order_id: order_id.to_string(),
            })
    }

    fn subscribe(&self) -> broadcast::Receiver<OrderUpdate> {
        self.updates.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MarketId, Outcome, Venue};
    use rust_decimal_macros::dec;

    const SCENARIO: &str = r#"
        [[markets]]
        id = "rain"
        question = "Will it rain?"
        yes_price = 0.46
        no_price = 0.50
    "#;

    fn venue(fill_probability: f64) -> PaperVenue {
        let config = PaperConfig {
            fill_probability,
            latency_ms: 100,
            seed: Some(7),
            ..PaperConfig::default()
        };
        PaperVenue::new(Arc::new(Scenario::parse(SCENARIO).unwrap()), &config)
    }

    fn buy_yes(limit: Price) -> Order {
        Order::try_new(
            MarketId::new("rain"),
            Venue::new("polymarket"),
            Outcome::Yes,
            OrderSide::Buy,
            limit,
            dec!(10),
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn crossing_order_fills_at_quote_after_latency() {
        let venue = venue(1.0);
        let mut updates = venue.subscribe();

        let id = venue.submit(&buy_yes(dec!(0.48))).await.unwrap();

        match updates.recv().await.unwrap() {
            OrderUpdate::Filled(fill) => {
                assert_eq!(fill.order_id, id);
                assert_eq!(fill.price, dec!(0.46));
                assert_eq!(fill.size, dec!(10));
            }
            other => panic!("expected fill, got {other:?}"),
        }
        assert_eq!(venue.resting_orders(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn order_below_quote_rests_until_cancelled() {
        let venue = venue(1.0);
        let mut updates = venue.subscribe();

        let id = venue.submit(&buy_yes(dec!(0.40))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(venue.resting_orders(), 1);

        venue.cancel(&id).await.unwrap();

        assert_eq!(
            updates.recv().await.unwrap(),
            OrderUpdate::CancelAcknowledged { order_id: id }
        );
        assert_eq!(venue.resting_orders(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_probability_never_fills() {
        let venue = venue(0.0);
        venue.submit(&buy_yes(dec!(0.48))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(venue.resting_orders(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_latency_suppresses_fill() {
        let venue = venue(1.0);
        let mut updates = venue.subscribe();

        let id = venue.submit(&buy_yes(dec!(0.48))).await.unwrap();
        venue.cancel(&id).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(matches!(
            updates.try_recv(),
            Ok(OrderUpdate::CancelAcknowledged { .. })
        ));
        assert!(updates.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn filled_order_refuses_cancel_without_ack() {
        let venue = venue(1.0);
        let mut updates = venue.subscribe();

        let id = venue.submit(&buy_yes(dec!(0.48))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let err = venue.cancel(&id).await.unwrap_err();

        assert!(matches!(err, VenueError::AlreadyFilled { .. }));
        assert!(matches!(updates.try_recv(), Ok(OrderUpdate::Filled(_))));
        assert!(updates.try_recv().is_err());
        let status = venue.order_status(&id).await.unwrap();
        assert_eq!(status.filled, dec!(10));
        assert_eq!(status.average_price, Some(dec!(0.46)));
        assert!(!status.open);
    }

    #[tokio::test(start_paused = true)]
    async fn resting_order_reports_open() {
        let venue = venue(1.0);
        let id = venue.submit(&buy_yes(dec!(0.40))).await.unwrap();

        let status = venue.order_status(&id).await.unwrap();

        assert!(status.open);
        assert_eq!(status.filled, Decimal::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn closed_orders_are_pruned_after_retention() {
        let venue = venue(1.0);
        let first = venue.submit(&buy_yes(dec!(0.48))).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(venue.closed_orders(), 1);

        tokio::time::sleep(Duration::from_secs(300)).await;
        venue.submit(&buy_yes(dec!(0.40))).await.unwrap();

        assert_eq!(venue.closed_orders(), 0);
        assert!(matches!(
            venue.order_status(&first).await,
            Err(VenueError::UnknownOrder { .. })
        ));
    }

    #[tokio::test]
    async fn cancel_of_unknown_order_fails() {
        let err = venue(1.0)
            .cancel(&OrderId::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, VenueError::UnknownOrder { .. }));
    }
}
