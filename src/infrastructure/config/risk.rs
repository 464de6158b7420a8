//! Risk management configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::application::risk::RiskLimits;
use crate::domain::{DiversificationWeighting, Usd};
use crate::error::ConfigError;

/// Capital and exposure limits. Percentages are fractions of `total_capital`.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Capital available to the bot in dollars.
    #[serde(default = "default_total_capital")]
    pub total_capital: Usd,
    /// Largest single allocation (e.g., 0.10 = 10%).
    #[serde(default = "default_max_position_pct")]
    pub max_position_pct: Decimal,
    /// Largest exposure to any one market.
    #[serde(default = "default_max_market_pct")]
    pub max_market_pct: Decimal,
    /// Largest exposure across all open allocations.
    #[serde(default = "default_max_total_pct")]
    pub max_total_pct: Decimal,
    /// Share of on-venue liquidity one position may consume.
    #[serde(default = "default_liquidity_pct")]
    pub liquidity_pct: Decimal,
    /// Diversification score weighting: `dollar` or `count`.
    #[serde(default)]
    pub weighting: DiversificationWeighting,
    /// Trip the circuit breaker when a trade is left unhedged.
    #[serde(default = "default_halt_on_legging")]
    pub halt_on_legging: bool,
}

fn default_total_capital() -> Usd {
    dec!(10000)
}

fn default_max_position_pct() -> Decimal {
    dec!(0.10)
}

fn default_max_market_pct() -> Decimal {
    dec!(0.20)
}

fn default_max_total_pct() -> Decimal {
    dec!(0.80)
}

fn default_liquidity_pct() -> Decimal {
    dec!(0.50)
}

const fn default_halt_on_legging() -> bool {
    true
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            total_capital: default_total_capital(),
            max_position_pct: default_max_position_pct(),
            max_market_pct: default_max_market_pct(),
            max_total_pct: default_max_total_pct(),
            liquidity_pct: default_liquidity_pct(),
            weighting: DiversificationWeighting::default(),
            halt_on_legging: default_halt_on_legging(),
        }
    }
}

fn fraction(field: &'static str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than 0 and at most 1".into(),
        });
    }
    Ok(())
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_capital <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "risk.total_capital",
                reason: "must be greater than 0".into(),
            });
        }
        fraction("risk.max_position_pct", self.max_position_pct)?;
        fraction("risk.max_market_pct", self.max_market_pct)?;
        fraction("risk.max_total_pct", self.max_total_pct)?;
        fraction("risk.liquidity_pct", self.liquidity_pct)?;
        if self.max_position_pct > self.max_total_pct {
            return Err(ConfigError::InvalidValue {
                field: "risk.max_position_pct",
                reason: "must not exceed max_total_pct".into(),
            });
        }
        Ok(())
    }
}

impl From<RiskConfig> for RiskLimits {
    fn from(config: RiskConfig) -> Self {
        Self {
            total_capital: config.total_capital,
            max_position_pct: config.max_position_pct,
            max_market_pct: config.max_market_pct,
            max_total_pct: config.max_total_pct,
            liquidity_pct: config.liquidity_pct,
            weighting: config.weighting,
            halt_on_legging: config.halt_on_legging,
        }
    }
}
