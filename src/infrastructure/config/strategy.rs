//! Detection strategy configuration.

use serde::Deserialize;

use crate::application::scanner::{CombinatorialConfig, RebalancingConfig};
use crate::error::ConfigError;

/// Configuration for both detectors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StrategiesConfig {
    #[serde(default)]
    pub rebalancing: RebalancingConfig,

    #[serde(default)]
    pub combinatorial: CombinatorialConfig,
}

impl StrategiesConfig {
    /// Names of the enabled strategies, in ranking order.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.rebalancing.enabled {
            names.push("rebalancing");
        }
        if self.combinatorial.enabled {
            names.push("combinatorial");
        }
        names
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rebalancing.validate()?;
        self.combinatorial.validate()
    }
}
