use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Allocation rejections from the risk manager.
///
/// These are normal negative results, not failures: the opportunity is
/// dropped for this cycle and may reappear on the next.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("circuit breaker active: {reason}")]
    CircuitBreakerActive { reason: String },

    #[error("allocation already outstanding for opportunity {opportunity_id}")]
    DuplicateAllocation { opportunity_id: String },

    #[error("no allocation outstanding for opportunity {opportunity_id}")]
    UnknownAllocation { opportunity_id: String },

    #[error("requested size must be positive, got {requested}")]
    NonPositiveSize { requested: Decimal },

    #[error("position limit exceeded: {requested} > {limit}")]
    PositionLimitExceeded { requested: Decimal, limit: Decimal },

    #[error("market exposure exceeded for {market_id}: {current} + {additional} > {limit}")]
    MarketExposureExceeded {
        market_id: String,
        current: Decimal,
        additional: Decimal,
        limit: Decimal,
    },

    #[error("exposure limit exceeded: {current} + {additional} > {limit}")]
    ExposureLimitExceeded {
        current: Decimal,
        additional: Decimal,
        limit: Decimal,
    },
}

/// Order submission and cancellation failures reported by a venue client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VenueError {
    #[error("order rejected by {venue}: {reason}")]
    Rejected { venue: String, reason: String },

    #[error("venue unavailable: {0}")]
    Unavailable(String),

    #[error("unknown order {order_id}")]
    UnknownOrder { order_id: String },

    #[error("order {order_id} already filled")]
    AlreadyFilled { order_id: String },
}

/// Failures of the external similarity scorer or embedder.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    #[error("scorer unavailable: {0}")]
    Unavailable(String),

    #[error("malformed scorer output: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error(transparent)]
    Venue(#[from] VenueError),

    #[error(transparent)]
    Scorer(#[from] ScorerError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("feed error: {0}")]
    Feed(String),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, Error>;
