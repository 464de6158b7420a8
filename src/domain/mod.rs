//! Venue-agnostic domain types.
//!
//! Everything here is pure data plus the invariants that guard it. Nothing
//! in this module performs I/O.

pub mod allocation;
pub mod book;
pub mod cluster;
pub mod drift;
pub mod error;
pub mod execution;
pub mod exposure;
pub mod history;
pub mod id;
pub mod market;
pub mod money;
pub mod opportunity;
pub mod order;
pub mod profitability;
pub mod relation;

pub use allocation::CapitalAllocation;
pub use book::{Books, OrderbookSnapshot, PriceLevel};
pub use cluster::{ClusterIndex, TopicCluster, TopicSignal};
pub use drift::{DriftAssessment, DriftRisk};
pub use error::DomainError;
pub use execution::{Execution, ExecutionEvent, ExecutionState, LeggingExposure, Transition};
pub use exposure::{DiversificationWeighting, ExposureMetrics, PnlSummary, StrategyPnl};
pub use history::MarketSnapshot;
pub use id::{ExecutionId, MarketId, OpportunityId, OrderId};
pub use market::{Market, Outcome, Quote, Venue};
pub use money::{Price, Usd, Volume};
pub use opportunity::{Leg, Opportunity, OpportunityKind, RebalanceDirection, StrategyKind};
pub use order::{Fill, Order, OrderSide, OrderStatus};
pub use profitability::{CostBreakdown, ProfitabilityAnalysis, RiskFactor};
pub use relation::{Direction, RelationKind, Relationship};
