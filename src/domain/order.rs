//! Orders and fills.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{MarketId, OrderId};
use super::market::{Outcome, Venue};
use super::money::{Price, Usd, Volume};

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Submitted,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// True once the venue will not fill any more of the order.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Expired
        )
    }
}

/// A fill notification for part or all of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub price: Price,
    pub size: Volume,
    pub filled_at: DateTime<Utc>,
}

impl Fill {
    pub fn new(order_id: OrderId, price: Price, size: Volume) -> Self {
        Self {
            order_id,
            price,
            size,
            filled_at: Utc::now(),
        }
    }
}

/// A limit order on one outcome of one market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    id: Option<OrderId>,
    market_id: MarketId,
    venue: Venue,
    outcome: Outcome,
    side: OrderSide,
    limit_price: Price,
    size: Volume,
    status: OrderStatus,
    filled_size: Volume,
    fill_notional: Usd,
}

impl Order {
    /// Create a new, unsubmitted order.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NonPositiveSize`] if `size` is not positive.
    pub fn try_new(
        market_id: MarketId,
        venue: Venue,
        outcome: Outcome,
        side: OrderSide,
        limit_price: Price,
        size: Volume,
    ) -> Result<Self, DomainError> {
        if size <= Decimal::ZERO {
            return Err(DomainError::NonPositiveSize { size });
        }
        if limit_price < Decimal::ZERO || limit_price > Decimal::ONE {
            return Err(DomainError::PriceOutOfRange { price: limit_price });
        }
        Ok(Self {
            id: None,
            market_id,
            venue,
            outcome,
            side,
            limit_price,
            size,
            status: OrderStatus::New,
            filled_size: Decimal::ZERO,
            fill_notional: Decimal::ZERO,
        })
    }

    /// Venue-assigned id, present once submitted.
    #[must_use]
    pub const fn id(&self) -> Option<&OrderId> {
        self.id.as_ref()
    }

    #[must_use]
    pub const fn market_id(&self) -> &MarketId {
        &self.market_id
    }

    #[must_use]
    pub const fn venue(&self) -> &Venue {
        &self.venue
    }

    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub const fn side(&self) -> OrderSide {
        self.side
    }

    #[must_use]
    pub const fn limit_price(&self) -> Price {
        self.limit_price
    }

    #[must_use]
    pub const fn size(&self) -> Volume {
        self.size
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    #[must_use]
    pub const fn filled_size(&self) -> Volume {
        self.filled_size
    }

    /// Quantity still open on the venue.
    #[must_use]
    pub fn remaining(&self) -> Volume {
        (self.size - self.filled_size).max(Decimal::ZERO)
    }

    /// Dollar value actually paid or received across all fills.
    #[must_use]
    pub const fn fill_notional(&self) -> Usd {
        self.fill_notional
    }

    /// Size-weighted average fill price, if anything filled.
    #[must_use]
    pub fn average_fill_price(&self) -> Option<Price> {
        if self.filled_size.is_zero() {
            None
        } else {
            Some(self.fill_notional / self.filled_size)
        }
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Reduce the order size before submission.
    pub fn resize(&mut self, size: Volume) {
        self.size = size;
    }

    pub fn mark_submitted(&mut self, id: OrderId) {
        self.id = Some(id);
        self.status = OrderStatus::Submitted;
    }

    /// Apply a fill, capping at the order size. Returns the quantity applied.
    pub fn apply_fill(&mut self, fill: &Fill) -> Volume {
        let applied = fill.size.min(self.remaining());
        if applied <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.filled_size += applied;
        self.fill_notional += applied * fill.price;
        self.status = if self.remaining().is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        applied
    }

    /// Mark cancelled. A filled order stays filled.
    pub fn mark_cancelled(&mut self) {
        if !self.is_filled() {
            self.status = OrderStatus::Cancelled;
        }
    }

    pub fn mark_rejected(&mut self) {
        self.status = OrderStatus::Rejected;
    }

    /// Mark expired after a deadline. A filled order stays filled.
    pub fn mark_expired(&mut self) {
        if !self.is_filled() {
            self.status = OrderStatus::Expired;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::try_new(
            MarketId::new("m"),
            Venue::new("polymarket"),
            Outcome::Yes,
            OrderSide::Buy,
            dec!(0.46),
            dec!(100),
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_positive_size() {
        let result = Order::try_new(
            MarketId::new("m"),
            Venue::new("x"),
            Outcome::Yes,
            OrderSide::Buy,
            dec!(0.5),
            dec!(0),
        );
        assert!(matches!(result, Err(DomainError::NonPositiveSize { .. })));
    }

    #[test]
    fn partial_then_full_fill() {
        let mut o = order();
        o.mark_submitted(OrderId::new("o-1"));

        o.apply_fill(&Fill::new(OrderId::new("o-1"), dec!(0.46), dec!(40)));
        assert_eq!(o.status(), OrderStatus::PartiallyFilled);
        assert_eq!(o.remaining(), dec!(60));

        o.apply_fill(&Fill::new(OrderId::new("o-1"), dec!(0.47), dec!(60)));
        assert_eq!(o.status(), OrderStatus::Filled);
        assert_eq!(o.fill_notional(), dec!(18.40) + dec!(28.20));
        assert_eq!(o.average_fill_price(), Some(dec!(0.466)));
    }

    #[test]
    fn overfill_is_capped() {
        let mut o = order();
        let applied = o.apply_fill(&Fill::new(OrderId::new("o"), dec!(0.46), dec!(150)));
        assert_eq!(applied, dec!(100));
        assert_eq!(o.filled_size(), dec!(100));
        assert_eq!(
            o.apply_fill(&Fill::new(OrderId::new("o"), dec!(0.46), dec!(1))),
            dec!(0)
        );
    }

    #[test]
    fn cancel_does_not_override_filled() {
        let mut o = order();
        o.apply_fill(&Fill::new(OrderId::new("o"), dec!(0.46), dec!(100)));
        o.mark_cancelled();
        assert_eq!(o.status(), OrderStatus::Filled);
    }

    #[test]
    fn final_statuses() {
        assert!(OrderStatus::Cancelled.is_final());
        assert!(OrderStatus::Expired.is_final());
        assert!(!OrderStatus::PartiallyFilled.is_final());
    }
}
