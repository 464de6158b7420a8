//! Venue fee schedules and network settlement cost.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::domain::{OrderSide, Price, Usd, Venue};
use crate::error::ConfigError;

/// Fee charged by a venue, as a fraction of leg notional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeeSchedule {
    /// Same rate at every price. `sell_rate` overrides it for sells.
    Flat {
        rate: Decimal,
        #[serde(default)]
        sell_rate: Option<Decimal>,
    },
    /// Cheaper near the extremes, dearer in the middle of the book.
    Tiered {
        #[serde(default = "default_low_price")]
        low_price: Price,
        #[serde(default = "default_high_price")]
        high_price: Price,
        #[serde(default = "default_extreme_rate")]
        extreme_rate: Decimal,
        #[serde(default = "default_mid_rate")]
        mid_rate: Decimal,
    },
}

fn default_low_price() -> Price {
    dec!(0.20)
}

fn default_high_price() -> Price {
    dec!(0.80)
}

fn default_extreme_rate() -> Decimal {
    dec!(0.005)
}

fn default_mid_rate() -> Decimal {
    dec!(0.015)
}

impl FeeSchedule {
    #[must_use]
    pub const fn flat(rate: Decimal) -> Self {
        Self::Flat {
            rate,
            sell_rate: None,
        }
    }

    #[must_use]
    pub fn tiered() -> Self {
        Self::Tiered {
            low_price: default_low_price(),
            high_price: default_high_price(),
            extreme_rate: default_extreme_rate(),
            mid_rate: default_mid_rate(),
        }
    }

    /// Fee rate for one leg.
    #[must_use]
    pub fn rate(&self, side: OrderSide, price: Price) -> Decimal {
        match self {
            Self::Flat { rate, sell_rate } => match side {
                OrderSide::Sell => sell_rate.unwrap_or(*rate),
                OrderSide::Buy => *rate,
            },
            Self::Tiered {
                low_price,
                high_price,
                extreme_rate,
                mid_rate,
            } => {
                if price < *low_price || price > *high_price {
                    *extreme_rate
                } else {
                    *mid_rate
                }
            }
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let rates: Vec<Decimal> = match self {
            Self::Flat { rate, sell_rate } => std::iter::once(*rate).chain(*sell_rate).collect(),
            Self::Tiered {
                extreme_rate,
                mid_rate,
                low_price,
                high_price,
            } => {
                if low_price > high_price {
                    return Err(ConfigError::InvalidValue {
                        field,
                        reason: "low_price must not exceed high_price".into(),
                    });
                }
                vec![*extreme_rate, *mid_rate]
            }
        };
        if rates.iter().any(|r| *r < Decimal::ZERO || *r >= Decimal::ONE) {
            return Err(ConfigError::InvalidValue {
                field,
                reason: "fee rates must be in [0, 1)".into(),
            });
        }
        Ok(())
    }
}

/// Fee schedules keyed by venue name.
///
/// Configured schedules are layered over the built-in ones, so a config
/// that only mentions one venue keeps the others.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "HashMap<String, FeeSchedule>")]
pub struct VenueFees {
    schedules: HashMap<String, FeeSchedule>,
}

fn default_schedules() -> HashMap<String, FeeSchedule> {
    HashMap::from([
        ("polymarket".to_string(), FeeSchedule::flat(dec!(0.02))),
        ("kalshi".to_string(), FeeSchedule::tiered()),
        ("pnp".to_string(), FeeSchedule::flat(dec!(0.01))),
        ("default".to_string(), FeeSchedule::flat(dec!(0.01))),
    ])
}

impl Default for VenueFees {
    fn default() -> Self {
        Self {
            schedules: default_schedules(),
        }
    }
}

impl From<HashMap<String, FeeSchedule>> for VenueFees {
    fn from(overrides: HashMap<String, FeeSchedule>) -> Self {
        overrides
            .into_iter()
            .fold(Self::default(), |fees, (venue, schedule)| fees.with(&venue, schedule))
    }
}

impl VenueFees {
    /// Override or add the schedule for one venue. `"default"` sets the fallback.
    #[must_use]
    pub fn with(mut self, venue: &str, schedule: FeeSchedule) -> Self {
        self.schedules.insert(venue.to_lowercase(), schedule);
        self
    }

    /// Schedule for `venue`, falling back to `"default"`, then to 1% flat.
    #[must_use]
    pub fn schedule(&self, venue: &Venue) -> FeeSchedule {
        self.schedules
            .get(venue.as_str())
            .or_else(|| self.schedules.get("default"))
            .cloned()
            .unwrap_or_else(|| FeeSchedule::flat(dec!(0.01)))
    }

    /// Fee in USD for a leg of `notional` at `price`.
    #[must_use]
    pub fn fee(&self, venue: &Venue, side: OrderSide, price: Price, notional: Usd) -> Usd {
        self.schedule(venue).rate(side, price) * notional
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schedules
            .values()
            .try_for_each(|schedule| schedule.validate("venues"))
    }
}

/// Settlement cost estimate for on-chain venues.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkCostConfig {
    #[serde(default = "default_gas_units")]
    pub gas_units: u64,
    #[serde(default = "default_gas_price_gwei")]
    pub gas_price_gwei: Decimal,
    /// USD price of the native gas token.
    #[serde(default = "default_native_usd")]
    pub native_usd: Decimal,
    /// Venues that settle on chain.
    #[serde(default = "default_on_chain_venues")]
    pub on_chain_venues: Vec<String>,
}

const fn default_gas_units() -> u64 {
    150_000
}

fn default_gas_price_gwei() -> Decimal {
    dec!(30)
}

fn default_native_usd() -> Decimal {
    Decimal::ONE
}

fn default_on_chain_venues() -> Vec<String> {
    vec!["polymarket".to_string(), "pnp".to_string()]
}

impl Default for NetworkCostConfig {
    fn default() -> Self {
        Self {
            gas_units: default_gas_units(),
            gas_price_gwei: default_gas_price_gwei(),
            native_usd: default_native_usd(),
            on_chain_venues: default_on_chain_venues(),
        }
    }
}

impl NetworkCostConfig {
    /// USD cost of one settlement.
    #[must_use]
    pub fn cost_usd(&self) -> Usd {
        Decimal::from(self.gas_units) * self.gas_price_gwei * dec!(0.000000001) * self.native_usd
    }

    #[must_use]
    pub fn is_on_chain(&self, venue: &Venue) -> bool {
        self.on_chain_venues
            .iter()
            .any(|v| v.eq_ignore_ascii_case(venue.as_str()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gas_price_gwei < Decimal::ZERO || self.native_usd < Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "network",
                reason: "gas price and native token price must not be negative".into(),
            });
        }
        Ok(())
    }
}
