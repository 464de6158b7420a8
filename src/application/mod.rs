//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.
//!
//! - [`classifier`] - Relationship classification between market pairs
//! - [`cluster`] - Topic clustering that bounds the pairs worth classifying
//! - [`profitability`] - Fee, slippage and settlement cost gate
//! - [`scanner`] - Rebalancing and combinatorial detectors plus ranking
//! - [`risk`] - Position sizing, capital allocation and the circuit breaker
//! - [`execution`] - Atomic two-leg execution
//! - [`pipeline`] - Scan, size, allocate and execute loop
//! - [`backtest`] - Replay of historical snapshots with performance metrics

pub mod backtest;
pub mod classifier;
pub mod cluster;
pub mod execution;
pub mod pipeline;
pub mod profitability;
pub mod risk;
pub mod scanner;
