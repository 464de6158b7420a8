//! Implementations of ports (hexagonal adapters).
//!
//! - [`inbound`]: Driving adapters; the command line.
//! - [`outbound`]: Driven adapters; scorer, venue and notifier backends.

pub mod inbound;
pub mod outbound;
