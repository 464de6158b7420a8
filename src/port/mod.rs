//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                  │                 │                  │
//!     ▼                  ▼                 ▼                  ▼
//! ┌─────────┐      ┌───────────┐     ┌──────────┐      ┌───────────┐
//! │  Feed   │      │  Orders   │     │  Scorer  │      │ Notifier  │
//! └─────────┘      └───────────┘     └──────────┘      └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`MarketFeed`] - Market snapshots and orderbooks
//! - [`OrderClient`] - Order submission, cancellation and the update stream
//! - [`SimilarityScorer`], [`Embedder`] - Black-box semantic models
//! - [`Llm`] - Text completion backing the default scorer
//! - [`Notifier`] - Event notifications

pub mod outbound;

pub use outbound::exchange::{OrderClient, OrderStatusReport, OrderUpdate};
pub use outbound::feed::MarketFeed;
pub use outbound::llm::Llm;
pub use outbound::notifier::{
    Event, ExecutionReport, LeggingEvent, Notifier, NotifierRegistry, OpportunityEvent, RiskEvent,
};
pub use outbound::scorer::{Embedder, NliLabel, Score, SimilarityScorer};
