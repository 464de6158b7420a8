//! Atomic two-leg execution.
//!
//! - [`engine`]: Drives the state machine against an order client
//! - [`pnl`]: Realized P&L from confirmed fills

pub mod engine;
pub mod pnl;

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::ConfigError;

pub use engine::ExecutionEngine;
pub use pnl::realized_pnl;

/// Execution timing and pricing.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Deadline for each leg to fill, in milliseconds.
    #[serde(default = "default_leg_timeout_ms")]
    pub leg_timeout_ms: u64,
    /// How long to wait for a cancel acknowledgement after a leg times out.
    #[serde(default = "default_cancel_ack_timeout_ms")]
    pub cancel_ack_timeout_ms: u64,
    /// Window during which fills after a cancel ack are reported.
    #[serde(default = "default_late_fill_watch_ms")]
    pub late_fill_watch_ms: u64,
    /// Limit price allowance over the quoted price, as a fraction.
    #[serde(default = "default_limit_slippage")]
    pub limit_slippage: Decimal,
}

const fn default_leg_timeout_ms() -> u64 {
    5_000
}

const fn default_cancel_ack_timeout_ms() -> u64 {
    2_000
}

const fn default_late_fill_watch_ms() -> u64 {
    30_000
}

fn default_limit_slippage() -> Decimal {
    dec!(0.02)
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            leg_timeout_ms: default_leg_timeout_ms(),
            cancel_ack_timeout_ms: default_cancel_ack_timeout_ms(),
            late_fill_watch_ms: default_late_fill_watch_ms(),
            limit_slippage: default_limit_slippage(),
        }
    }
}

impl ExecutionConfig {
    #[must_use]
    pub const fn leg_timeout(&self) -> Duration {
        Duration::from_millis(self.leg_timeout_ms)
    }

    #[must_use]
    pub const fn cancel_ack_timeout(&self) -> Duration {
        Duration::from_millis(self.cancel_ack_timeout_ms)
    }

    #[must_use]
    pub const fn late_fill_watch(&self) -> Duration {
        Duration::from_millis(self.late_fill_watch_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.leg_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution.leg_timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        if self.cancel_ack_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "execution.cancel_ack_timeout_ms",
                reason: "must be greater than 0".into(),
            });
        }
        if self.limit_slippage < Decimal::ZERO || self.limit_slippage >= Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "execution.limit_slippage",
                reason: "must be in [0, 1)".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timeouts() {
        let config = ExecutionConfig::default();
        assert_eq!(config.leg_timeout(), Duration::from_secs(5));
        assert_eq!(config.cancel_ack_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_leg_timeout_is_invalid() {
        let config = ExecutionConfig {
            leg_timeout_ms: 0,
            ..ExecutionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "execution.leg_timeout_ms",
                ..
            })
        ));
    }
}
