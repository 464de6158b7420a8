//! Paper venue configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Settings for the simulated venue.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// TOML file listing markets and orderbooks.
    #[serde(default = "default_scenario")]
    pub scenario: PathBuf,
    /// Chance that an order whose limit crosses the quote fills at all.
    #[serde(default = "default_fill_probability")]
    pub fill_probability: f64,
    /// Delay between acceptance and the simulated fill.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Seed for reproducible runs. Entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Capacity of the order update channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// How long filled and cancelled orders stay queryable.
    #[serde(default = "default_closed_retention_secs")]
    pub closed_retention_secs: u64,
}

fn default_scenario() -> PathBuf {
    PathBuf::from("scenario.toml")
}

const fn default_fill_probability() -> f64 {
    0.95
}

const fn default_latency_ms() -> u64 {
    150
}

const fn default_channel_capacity() -> usize {
    1024
}

const fn default_closed_retention_secs() -> u64 {
    300
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            scenario: default_scenario(),
            fill_probability: default_fill_probability(),
            latency_ms: default_latency_ms(),
            seed: None,
            channel_capacity: default_channel_capacity(),
            closed_retention_secs: default_closed_retention_secs(),
        }
    }
}

impl PaperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.fill_probability) {
            return Err(ConfigError::InvalidValue {
                field: "paper.fill_probability",
                reason: "must be between 0 and 1".into(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "paper.channel_capacity",
                reason: "must be greater than 0".into(),
            });
        }
        if self.closed_retention_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "paper.closed_retention_secs",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}
