//! Order execution port.
//!
//! Venues acknowledge submissions synchronously but report fills and cancel
//! acknowledgements asynchronously on a single update stream. Callers
//! subscribe before submitting so no update for their order can be missed.
//! When a subscriber lags and updates are dropped, [`OrderClient::order_status`]
//! is the authoritative fallback.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{Fill, Order, OrderId, Price, Volume};
use crate::error::VenueError;

/// Asynchronous order lifecycle notification.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderUpdate {
    /// Part or all of an order filled.
    Filled(Fill),
    /// The venue confirmed a cancel; nothing further will fill.
    CancelAcknowledged { order_id: OrderId },
    /// The venue rejected or expired a resting order.
    Rejected { order_id: OrderId, reason: String },
}

impl OrderUpdate {
    /// Order this update refers to.
    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Filled(fill) => &fill.order_id,
            Self::CancelAcknowledged { order_id } | Self::Rejected { order_id, .. } => order_id,
        }
    }
}

/// Venue-side state of one order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderStatusReport {
    /// Total quantity filled so far.
    pub filled: Volume,
    /// Size-weighted average fill price, if anything filled.
    pub average_price: Option<Price>,
    /// Whether the order can still fill.
    pub open: bool,
}

/// Order submission client.
///
/// A single client routes orders by [`Order::venue`]; multi-venue
/// deployments compose per-venue clients behind one implementation.
#[async_trait]
pub trait OrderClient: Send + Sync {
    /// Client name for logging.
    fn name(&self) -> &'static str;

    /// Submit an order. Returns the venue-assigned id on acceptance.
    async fn submit(&self, order: &Order) -> Result<OrderId, VenueError>;

    /// Request cancellation. Confirmation arrives on the update stream.
    ///
    /// An order that already filled is not acknowledged as cancelled.
    async fn cancel(&self, order_id: &OrderId) -> Result<(), VenueError>;

    /// Current fill state of an order, straight from the venue.
    async fn order_status(&self, order_id: &OrderId) -> Result<OrderStatusReport, VenueError>;

    /// Subscribe to order updates for all orders placed through this client.
    fn subscribe(&self) -> broadcast::Receiver<OrderUpdate>;
}
