//! Outbound adapters (driven side).

pub mod inference;
pub mod llm;
pub mod notifier;
pub mod paper;
