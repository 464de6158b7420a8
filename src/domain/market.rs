//! Binary prediction market snapshots.
//!
//! A [`Market`] is an immutable snapshot of one YES/NO question on one
//! venue as reported by the market feed. Snapshots are replaced wholesale on
//! the next refresh, never mutated.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::MarketId;
use super::money::{Price, Usd};

/// Trading venue name, used to look up fee schedules and route orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Venue(String);

impl Venue {
    /// Create a venue from its configured name. Names are lowercased.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().to_lowercase())
    }

    /// Get the venue name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Venue {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One side of a binary market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Yes,
    No,
}

impl Outcome {
    /// The other side of the market.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// Quoted price and available liquidity for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quote {
    price: Price,
    liquidity: Usd,
}

impl Quote {
    /// Quoted price.
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Dollar liquidity resting on this outcome.
    #[must_use]
    pub const fn liquidity(&self) -> Usd {
        self.liquidity
    }
}

/// Immutable snapshot of a binary market.
#[derive(Debug, Clone, Serialize)]
pub struct Market {
    id: MarketId,
    venue: Venue,
    question: String,
    resolution_date: Option<DateTime<Utc>>,
    resolution_source: Option<String>,
    resolution_criteria: Option<String>,
    yes: Quote,
    no: Quote,
}

impl Market {
    /// Create a market snapshot with validated prices and no liquidity.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::PriceOutOfRange`] if either price lies outside `[0, 1]`.
    pub fn try_new(
        id: impl Into<MarketId>,
        venue: Venue,
        question: impl Into<String>,
        yes_price: Price,
        no_price: Price,
    ) -> Result<Self, DomainError> {
        for price in [yes_price, no_price] {
            if price < Decimal::ZERO || price > Decimal::ONE {
                return Err(DomainError::PriceOutOfRange { price });
            }
        }

        Ok(Self {
            id: id.into(),
            venue,
            question: question.into(),
            resolution_date: None,
            resolution_source: None,
            resolution_criteria: None,
            yes: Quote {
                price: yes_price,
                liquidity: Decimal::ZERO,
            },
            no: Quote {
                price: no_price,
                liquidity: Decimal::ZERO,
            },
        })
    }

    /// Attach per-side liquidity in dollars.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NegativeLiquidity`] if either amount is negative.
    pub fn with_liquidity(mut self, yes: Usd, no: Usd) -> Result<Self, DomainError> {
        for liquidity in [yes, no] {
            if liquidity < Decimal::ZERO {
                return Err(DomainError::NegativeLiquidity { liquidity });
            }
        }
        self.yes.liquidity = yes;
        self.no.liquidity = no;
        Ok(self)
    }

    /// Attach the resolution timestamp.
    #[must_use]
    pub fn with_resolution_date(mut self, date: DateTime<Utc>) -> Self {
        self.resolution_date = Some(date);
        self
    }

    /// Attach the resolution source (e.g. "AP News").
    #[must_use]
    pub fn with_resolution_source(mut self, source: impl Into<String>) -> Self {
        self.resolution_source = Some(source.into());
        self
    }

    /// Attach the written resolution criteria.
    #[must_use]
    pub fn with_resolution_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.resolution_criteria = Some(criteria.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> &MarketId {
        &self.id
    }

    #[must_use]
    pub const fn venue(&self) -> &Venue {
        &self.venue
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub const fn resolution_date(&self) -> Option<DateTime<Utc>> {
        self.resolution_date
    }

    #[must_use]
    pub fn resolution_source(&self) -> Option<&str> {
        self.resolution_source.as_deref()
    }

    #[must_use]
    pub fn resolution_criteria(&self) -> Option<&str> {
        self.resolution_criteria.as_deref()
    }

    /// Quote for one outcome.
    #[must_use]
    pub const fn quote(&self, outcome: Outcome) -> &Quote {
        match outcome {
            Outcome::Yes => &self.yes,
            Outcome::No => &self.no,
        }
    }

    #[must_use]
    pub const fn yes_price(&self) -> Price {
        self.yes.price
    }

    #[must_use]
    pub const fn no_price(&self) -> Price {
        self.no.price
    }

    /// Sum of liquidity across both outcomes.
    #[must_use]
    pub fn total_liquidity(&self) -> Usd {
        self.yes.liquidity + self.no.liquidity
    }

    /// True when both sides carry a usable quote. Zero-priced sides indicate
    /// the feed has no price for the outcome.
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.yes.price > Decimal::ZERO && self.no.price > Decimal::ZERO
    }
}
