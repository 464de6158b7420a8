//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`venue`] - [`ScriptedVenue`](venue::ScriptedVenue), an order client
//!   whose fills, rejections and cancel acknowledgements follow a script.
//! - [`scorer`] - Scripted similarity scorer and embedder.
//! - [`llm`] - A completion model returning a canned response.
//! - [`notifier`] - A notifier that records every event.
//! - [`feed`] - A market feed serving fixed snapshots.
//! - [`domain`] - Builders for markets, books and opportunities.

pub mod domain;
pub mod feed;
pub mod llm;
pub mod notifier;
pub mod scorer;
pub mod venue;
