//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the external collaborators of the core: market
//! data, order execution, semantic scoring, and notifications.

pub mod exchange;
pub mod feed;
pub mod llm;
pub mod notifier;
pub mod scorer;
