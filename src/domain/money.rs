//! Monetary types for price, size and dollar amounts.

use rust_decimal::Decimal;

/// Price represented as a Decimal for precision. Prediction-market prices
/// are probabilities in `[0, 1]`.
pub type Price = Decimal;

/// Contract quantity represented as a Decimal for precision.
pub type Volume = Decimal;

/// Dollar amount represented as a Decimal for precision.
pub type Usd = Decimal;

/// Convert a decimal ratio to `f64` for scoring math. Non-representable
/// values collapse to zero.
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    value.to_f64().unwrap_or(0.0)
}
