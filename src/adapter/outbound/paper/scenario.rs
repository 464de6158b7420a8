//! Scenario files for the paper venue.
//!
//! A scenario is a TOML document of `[[markets]]`, each optionally carrying
//! `[[markets.books]]` depth for one outcome. Price levels are
//! `[price, size]` pairs.
//!
//! ```toml
//! [[markets]]
//! id = "senate-dem"
//! question = "Will Democrats win the Senate?"
//! yes_price = 0.46
//! no_price = 0.46
//! yes_liquidity = 5000
//! no_liquidity = 5000
//! resolution_date = "2026-11-03T00:00:00Z"
//!
//! [[markets.books]]
//! outcome = "yes"
//! asks = [[0.46, 2000], [0.47, 5000]]
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{
    Books, Market, MarketId, OrderbookSnapshot, Outcome, Price, PriceLevel, Usd, Venue, Volume,
};
use crate::error::{ConfigError, Result};

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    #[serde(default)]
    markets: Vec<ScenarioMarket>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ScenarioMarket {
    id: String,
    #[serde(default = "default_venue")]
    venue: String,
    question: String,
    yes_price: Price,
    no_price: Price,
    #[serde(default)]
    yes_liquidity: Usd,
    #[serde(default)]
    no_liquidity: Usd,
    resolution_date: Option<DateTime<Utc>>,
    resolution_source: Option<String>,
    resolution_criteria: Option<String>,
    #[serde(default)]
    books: Vec<ScenarioBook>,
}

#[derive(Debug, Deserialize)]
struct ScenarioBook {
    outcome: Outcome,
    #[serde(default)]
    bids: Vec<(Price, Volume)>,
    #[serde(default)]
    asks: Vec<(Price, Volume)>,
}

fn default_venue() -> String {
    "polymarket".into()
}

fn levels(raw: Vec<(Price, Volume)>) -> Vec<PriceLevel> {
    raw.into_iter()
        .filter(|(_, size)| *size > Decimal::ZERO)
        .map(|(price, size)| PriceLevel::new(price, size))
        .collect()
}

/// Markets and books served by the paper venue.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    markets: Vec<Market>,
    books: HashMap<(MarketId, Outcome), OrderbookSnapshot>,
}

impl Scenario {
    /// Parse a scenario from TOML content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and a domain error
    /// for out-of-range prices or negative liquidity.
    pub fn parse(content: &str) -> Result<Self> {
        let file: ScenarioFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        Self::from_markets(file.markets)
    }

    pub(super) fn from_markets(markets: Vec<ScenarioMarket>) -> Result<Self> {
        let mut scenario = Self::default();
        for raw in markets {
            let mut market = Market::try_new(
                raw.id.as_str(),
                Venue::new(raw.venue),
                raw.question,
                raw.yes_price,
                raw.no_price,
            )?
            .with_liquidity(raw.yes_liquidity, raw.no_liquidity)?;
            if let Some(date) = raw.resolution_date {
                market = market.with_resolution_date(date);
            }
            if let Some(source) = raw.resolution_source {
                market = market.with_resolution_source(source);
            }
            if let Some(criteria) = raw.resolution_criteria {
                market = market.with_resolution_criteria(criteria);
            }

            for book in raw.books {
                let snapshot = OrderbookSnapshot::new(
                    market.id().clone(),
                    book.outcome,
                    levels(book.bids),
                    levels(book.asks),
                );
                scenario
                    .books
                    .insert((market.id().clone(), book.outcome), snapshot);
            }
            scenario.markets.push(market);
        }
        Ok(scenario)
    }

    /// Read and parse a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`] if the file cannot be read, or any
    /// error from [`Scenario::parse`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    #[must_use]
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    #[must_use]
    pub fn book(&self, market_id: &MarketId, outcome: Outcome) -> Option<&OrderbookSnapshot> {
        self.books.get(&(market_id.clone(), outcome))
    }

    /// Every book in the scenario, keyed the way the analyzer reads them.
    #[must_use]
    pub fn books(&self) -> Books {
        self.books.values().cloned().collect()
    }

    /// Quoted price for one outcome of a scenario market.
    #[must_use]
    pub fn quote(&self, market_id: &MarketId, outcome: Outcome) -> Option<Price> {
        self.markets
            .iter()
            .find(|m| m.id() == market_id)
            .map(|m| m.quote(outcome).price())
    }
}
