//! Handler for the `run` command.

use serde_json::json;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::adapter::inbound::cli::output;
use crate::application::pipeline::Pipeline;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::Config;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    apply_overrides(&mut config, args, output::is_json());
    config.validate()?;
    config.init_logging();

    print_startup(&config);
    let pipeline = bootstrap::build_pipeline(&config)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for Ctrl-C");
                // Keep the sender alive so the loop does not read a closed channel as shutdown.
                std::future::pending::<()>().await;
            }
        }
    });

    info!("arbiter starting");
    pipeline.run(shutdown_rx).await?;
    info!("arbiter stopped");

    print_session(&pipeline);
    Ok(())
}

/// Fold command-line overrides into the loaded configuration.
pub fn apply_overrides(config: &mut Config, args: &RunArgs, force_json_logs: bool) {
    if args.dry_run {
        config.scanner.dry_run = true;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs || force_json_logs {
        config.logging.format = LogFormat::Json;
    }
    if let Some(interval) = args.interval {
        config.scanner.interval_secs = interval;
    }
    if let Some(capital) = args.capital {
        config.risk.total_capital = capital;
    }
}

fn print_startup(config: &Config) {
    let strategies = config.strategies.enabled();
    let strategies = if strategies.is_empty() {
        "none".to_string()
    } else {
        strategies.join(", ")
    };

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Scenario", config.paper.scenario.display());
    output::field("Capital", format!("${}", config.risk.total_capital));
    output::field("Strategies", strategies);
    output::field("Interval", format!("{}s", config.scanner.interval_secs));
    if output::verbosity() > 0 {
        output::field("Min margin", config.profitability.min_margin);
        output::field("Leg timeout", format!("{}ms", config.execution.leg_timeout_ms));
    }

    if config.scanner.dry_run {
        output::warning("Dry-run mode enabled - opportunities are ranked but not traded");
    }
}

fn print_session(pipeline: &Pipeline) {
    let pnl = pipeline.pnl();
    let exposure = pipeline.exposure();
    let breaker = pipeline.risk().is_circuit_breaker_active();

    if output::is_json() {
        output::json_output(json!({
            "command": "run",
            "trades": pnl.overall.trades,
            "winners": pnl.overall.winners,
            "losers": pnl.overall.losers,
            "total_pnl": pnl.overall.total_pnl.to_string(),
            "total_exposure": exposure.total_exposure.to_string(),
            "held_allocations": exposure.held_allocations,
            "circuit_breaker": breaker,
        }));
        return;
    }

    output::section("Session");
    output::field("Trades", pnl.overall.trades);
    output::field(
        "Win rate",
        format!("{:.0}%", pnl.overall.win_rate() * 100.0),
    );
    output::field("P&L", output::signed(pnl.overall.total_pnl));
    output::field("Exposure", format!("${}", exposure.total_exposure));
    if exposure.held_allocations > 0 {
        output::warning(&format!(
            "{} allocation(s) held behind unhedged legs",
            exposure.held_allocations
        ));
    }
    if breaker {
        output::warning("Circuit breaker is active");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: PathBuf::from("config.toml"),
            dry_run: false,
            log_level: None,
            json_logs: false,
            interval: None,
            capital: None,
        }
    }

    #[test]
    fn no_overrides_keep_config() {
        let mut config = Config::default();
        apply_overrides(&mut config, &args(), false);
        assert!(!config.scanner.dry_run);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.risk.total_capital, dec!(10000));
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = Config::default();
        let args = RunArgs {
            dry_run: true,
            log_level: Some("debug".into()),
            interval: Some(5),
            capital: Some(dec!(2500)),
            ..args()
        };

        apply_overrides(&mut config, &args, false);

        assert!(config.scanner.dry_run);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.scanner.interval_secs, 5);
        assert_eq!(config.risk.total_capital, dec!(2500));
    }

    #[test]
    fn json_output_forces_json_logs() {
        let mut config = Config::default();
        apply_overrides(&mut config, &args(), true);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let mut config = Config::default();
        let args = RunArgs {
            interval: Some(0),
            ..args()
        };
        apply_overrides(&mut config, &args, false);
        assert!(config.validate().is_err());
    }
}
