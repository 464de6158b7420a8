//! Arbiter - prediction market arbitrage detection and execution.
//!
//! The crate finds mispricings between binary prediction markets and trades
//! them without taking directional risk:
//!
//! - **Rebalancing** - YES + NO on one market deviates from $1.00
//! - **Combinatorial** - two logically related markets whose prices violate
//!   the relationship (implication, mutual exclusion, complement)
//!
//! # Architecture
//!
//! The crate follows a hexagonal layout:
//!
//! - [`domain`] - Venue-agnostic types and invariants. No I/O.
//! - [`port`] - Traits for the feed, order client, scorer and notifier
//! - [`application`] - Classifier, profitability gate, scanner, risk manager,
//!   execution engine, the pipeline that drives them and a historical
//!   backtester
//! - [`adapter`] - CLI plus outbound adapters (LLM scorer, paper venue,
//!   notifiers)
//! - [`infrastructure`] - Configuration and wiring
//!
//! # Features
//!
//! - `testkit` - Expose scripted ports and domain builders for integration tests
//!
//! # Example
//!
//! ```no_run
//! use arbiter::infrastructure::bootstrap;
//! use arbiter::infrastructure::config::Config;
//!
//! # async fn demo() -> arbiter::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let pipeline = bootstrap::build_pipeline(&config)?;
//! for ranked in pipeline.scan().await? {
//!     println!("{}", ranked.opportunity.summary());
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
