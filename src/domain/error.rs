//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors and by the execution
//! state machine when an event does not apply to the current state.
//!
//! # Examples
//!
//! ```
//! use arbiter::domain::error::DomainError;
//! use arbiter::domain::market::{Market, Venue};
//! use rust_decimal_macros::dec;
//!
//! let result = Market::try_new("m-1", Venue::new("polymarket"), "Will it rain?", dec!(1.20), dec!(0.40));
//!
//! assert!(matches!(result, Err(DomainError::PriceOutOfRange { .. })));
//! ```

use thiserror::Error;

use super::execution::{ExecutionEvent, ExecutionState};

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Outcome prices are probabilities and must lie in `[0, 1]`.
    #[error("price must be within [0, 1], got {price}")]
    PriceOutOfRange {
        /// The invalid price that was provided.
        price: rust_decimal::Decimal,
    },

    /// Liquidity cannot be negative.
    #[error("liquidity must be non-negative, got {liquidity}")]
    NegativeLiquidity {
        /// The invalid liquidity that was provided.
        liquidity: rust_decimal::Decimal,
    },

    /// Order size must be positive.
    #[error("size must be positive, got {size}")]
    NonPositiveSize {
        /// The invalid size that was provided.
        size: rust_decimal::Decimal,
    },

    /// The execution engine only sequences two-leg trades.
    #[error("execution requires exactly 2 legs, got {count}")]
    UnsupportedLegCount {
        /// Number of legs on the rejected opportunity.
        count: usize,
    },

    /// The venue could not confirm whether an order filled.
    #[error("fill state of order {order_id} could not be confirmed")]
    OrderStateUnknown {
        /// Order whose state is unknown.
        order_id: String,
    },

    /// An event arrived that the state machine does not accept in its current state.
    #[error("invalid transition: {event:?} in state {from}")]
    InvalidTransition {
        /// State the machine was in.
        from: ExecutionState,
        /// Rejected event.
        event: ExecutionEvent,
    },
}
