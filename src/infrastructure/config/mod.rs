//! Infrastructure configuration modules.

pub mod llm;
pub mod logging;
pub mod risk;
pub mod settings;
pub mod strategy;

pub use settings::Config;
