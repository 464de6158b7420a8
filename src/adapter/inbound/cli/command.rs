//! Command-line interface definitions.
//!
//! Defines the CLI structure for the arbiter application using `clap`.
//! The CLI runs the scan/execute loop, prints a one-shot ranking, replays
//! history, and manages configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use super::paths;

/// Prediction market arbitrage detection and execution CLI
#[derive(Parser, Debug)]
#[command(name = "arbiter")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the arbiter CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scan and execute loop until interrupted
    Run(RunArgs),

    /// Scan once and print ranked opportunities without trading
    Scan(ScanArgs),

    /// Replay historical snapshots and report performance metrics
    Backtest(BacktestArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Explore available strategies
    #[command(subcommand)]
    Strategies(StrategyCommand),
}

/// Subcommands for `arbiter config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Generate a configuration file and sample scenario from templates.
    Init(ConfigInitArgs),
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Subcommands for `arbiter strategies`.
#[derive(Subcommand, Debug)]
pub enum StrategyCommand {
    /// List the detection strategies.
    List,
    /// Explain how a strategy finds and trades a mispricing.
    Explain {
        /// Strategy name (`rebalancing` or `combinatorial`).
        name: String,
    },
}

/// Shared argument struct for commands that require only a configuration path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,
}

/// Arguments for the `config init` subcommand.
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Output path for the generated configuration file.
    #[arg(default_value_os_t = paths::default_config())]
    pub path: PathBuf,
    /// Overwrite existing files.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `run` subcommand.
///
/// Optional fields override the corresponding configuration file values.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Detect and rank opportunities but skip execution.
    #[arg(long)]
    pub dry_run: bool,

    /// Override log level (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,

    /// Override seconds between scan cycles.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Override total capital (USD).
    #[arg(long)]
    pub capital: Option<Decimal>,
}

/// Arguments for the `scan` subcommand.
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Show at most this many opportunities.
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the `backtest` subcommand.
#[derive(Parser, Debug)]
pub struct BacktestArgs {
    /// Path to the configuration file.
    #[arg(short, long, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Override the history file from the configuration.
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Print every simulated trade.
    #[arg(long)]
    pub trades: bool,
}
