//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Every section is optional; an empty file yields the defaults. Secrets such
//! as `OPENAI_API_KEY` come from the environment only.
//!
//! # Example
//!
//! ```no_run
//! use arbiter::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::llm::LlmConfig;
use super::logging::LoggingConfig;
use super::risk::RiskConfig;
use super::strategy::StrategiesConfig;
use crate::adapter::outbound::paper::PaperConfig;
use crate::application::backtest::BacktestConfig;
use crate::application::classifier::ClassifierConfig;
use crate::application::cluster::ClusterConfig;
use crate::application::execution::ExecutionConfig;
use crate::application::pipeline::PipelineConfig;
use crate::application::profitability::{NetworkCostConfig, ProfitabilityConfig, VenueFees};
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Capital and exposure limits.
    #[serde(default, alias = "capital")]
    pub risk: RiskConfig,

    /// Profitability gate thresholds.
    #[serde(default)]
    pub profitability: ProfitabilityConfig,

    /// Settlement cost for on-chain venues.
    #[serde(default)]
    pub network: NetworkCostConfig,

    /// Fee schedules by venue name, layered over the built-in ones.
    #[serde(default)]
    pub venues: VenueFees,

    /// Relationship classification thresholds.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Topic clustering of market questions.
    #[serde(default)]
    pub clustering: ClusterConfig,

    /// Detector settings.
    #[serde(default)]
    pub strategies: StrategiesConfig,

    /// Leg deadlines and limit slippage.
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Scan cadence, ranking cap and dry-run switch.
    #[serde(default)]
    pub scanner: PipelineConfig,

    /// Scorer and embedder backend.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Simulated venue.
    #[serde(default)]
    pub paper: PaperConfig,

    /// Historical replay.
    #[serde(default)]
    pub backtest: BacktestConfig,
}

impl Config {
    /// Parse configuration from TOML content and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or a value is out
    /// of range.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// Relative `paper.scenario` and `backtest.history` paths are resolved
    /// against the directory holding the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML content is
    /// malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse_toml(&content)?;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            for file in [&mut config.paper.scenario, &mut config.backtest.history] {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }
        Ok(config)
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.logging.validate()?;
        self.risk.validate()?;
        self.profitability.validate()?;
        self.network.validate()?;
        self.venues.validate()?;
        self.classifier.validate()?;
        self.clustering.validate()?;
        self.strategies.validate()?;
        self.execution.validate()?;
        self.scanner.validate()?;
        self.llm.validate()?;
        self.paper.validate()?;
        self.backtest.validate()
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
