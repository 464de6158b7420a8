//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::llm::openai;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::Config;

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Sample scenario written next to a fresh config.
const SCENARIO_TEMPLATE: &str = include_str!("../../../../scenario.toml.example");

/// Execute `config init`: write the config template and, beside it, the
/// sample scenario it points at.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    let scenario = path.with_file_name("scenario.toml");
    for target in [path, scenario.as_path()] {
        if target.exists() && !force {
            return Err(ConfigError::InvalidValue {
                field: "config",
                reason: format!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                ),
            }
            .into());
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, CONFIG_TEMPLATE)?;
    fs::write(&scenario, SCENARIO_TEMPLATE)?;

    output::section("Config Initialized");
    output::success("Created configuration file");
    output::field("Config", path.display());
    output::field("Scenario", scenario.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your settings", path.display()));
    output::note(&format!(
        "2. Set {} to enable combinatorial detection",
        openai::API_KEY_VAR
    ));
    output::note(&format!("3. Run: arbiter config validate -c {}", path.display()));
    output::note(&format!("4. Run: arbiter run -c {}", path.display()));
    Ok(())
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "path": path.display().to_string(),
            "strategies": config.strategies.enabled(),
            "dry_run": config.scanner.dry_run,
            "risk": {
                "total_capital": config.risk.total_capital.to_string(),
                "max_position_pct": config.risk.max_position_pct.to_string(),
                "max_market_pct": config.risk.max_market_pct.to_string(),
                "max_total_pct": config.risk.max_total_pct.to_string(),
                "halt_on_legging": config.risk.halt_on_legging,
            },
            "profitability": {
                "min_margin": config.profitability.min_margin.to_string(),
                "max_slippage": config.profitability.max_slippage.to_string(),
            },
            "execution": {
                "leg_timeout_ms": config.execution.leg_timeout_ms,
                "cancel_ack_timeout_ms": config.execution.cancel_ack_timeout_ms,
            },
            "llm": {
                "model": config.llm.model,
                "embedding_model": config.llm.embedding_model,
            },
            "paper": {
                "scenario": config.paper.scenario.display().to_string(),
                "fill_probability": config.paper.fill_probability,
            },
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("Path", path.display());
    output::field("Dry run", config.scanner.dry_run);
    output::field("Interval", format!("{}s", config.scanner.interval_secs));

    output::section("Strategies");
    let strategies = config.strategies.enabled();
    if strategies.is_empty() {
        output::note("(none enabled)");
    } else {
        for name in strategies {
            output::note(&format!("- {name}"));
        }
    }

    let risk = &config.risk;
    output::section("Risk");
    output::field("Capital", format!("${}", risk.total_capital));
    output::field("Max position", percent(risk.max_position_pct));
    output::field("Max market", percent(risk.max_market_pct));
    output::field("Max total", percent(risk.max_total_pct));
    output::field("Halt on legging", risk.halt_on_legging);

    output::section("Profitability");
    output::field("Min margin", percent(config.profitability.min_margin));
    output::field("Max slippage", percent(config.profitability.max_slippage));

    output::section("Execution");
    output::field(
        "Leg timeout",
        format!("{}ms", config.execution.leg_timeout_ms),
    );
    output::field(
        "Cancel ack",
        format!("{}ms", config.execution.cancel_ack_timeout_ms),
    );

    output::section("LLM");
    output::field("Model", &config.llm.model);
    output::field("Embeddings", &config.llm.embedding_model);
    if api_key_present() {
        output::success(&format!("{} is set", openai::API_KEY_VAR));
    } else {
        output::warning(&format!("{} not set", openai::API_KEY_VAR));
    }

    output::section("Paper venue");
    output::field("Scenario", config.paper.scenario.display());
    output::field("Fill chance", config.paper.fill_probability);

    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    output::section("Config Validation");
    output::field("Path", path.display());
    let config = Config::load(path)?;
    output::success("Config file is valid");

    let warnings = warnings(&config, api_key_present());
    if !warnings.is_empty() {
        output::section("Warnings");
        for warning in &warnings {
            output::warning(warning);
        }
    }

    output::field("Next", format!("arbiter config show -c {}", path.display()));
    Ok(())
}

/// Problems that do not stop the bot but change what it does.
pub fn warnings(config: &Config, api_key_present: bool) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.strategies.enabled().is_empty() {
        warnings.push("No strategies enabled; the scanner will find nothing".to_string());
    }
    if config.strategies.combinatorial.enabled && !api_key_present {
        warnings.push(format!(
            "Combinatorial detection needs {}; only rebalancing will run",
            openai::API_KEY_VAR
        ));
    }
    if !config.paper.scenario.exists() {
        warnings.push(format!(
            "Scenario file not found: {}",
            config.paper.scenario.display()
        ));
    }
    if config.scanner.dry_run {
        warnings.push("Dry-run mode enabled; nothing will be traded".to_string());
    }
    warnings
}

fn api_key_present() -> bool {
    std::env::var(openai::API_KEY_VAR).is_ok_and(|key| !key.trim().is_empty())
}

fn percent(fraction: rust_decimal::Decimal) -> String {
    format!("{}%", (fraction * rust_decimal::Decimal::ONE_HUNDRED).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn templates_parse() {
        assert!(Config::parse_toml(CONFIG_TEMPLATE).is_ok());
        let scenario =
            crate::adapter::outbound::paper::Scenario::parse(SCENARIO_TEMPLATE).unwrap();
        assert!(!scenario.markets().is_empty());
    }

    #[test]
    fn init_writes_config_and_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        execute_init(&path, false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.paper.scenario, dir.path().join("nested").join("scenario.toml"));
        assert!(config.paper.scenario.exists());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "existing").unwrap();

        let err = execute_init(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");

        execute_init(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn validate_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(execute_validate(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn warns_about_missing_key_and_scenario() {
        let mut config = Config::default();
        config.paper.scenario = "nowhere/scenario.toml".into();

        let found = warnings(&config, false);
        assert!(found.iter().any(|w| w.contains(openai::API_KEY_VAR)));
        assert!(found.iter().any(|w| w.contains("Scenario file not found")));

        assert!(!warnings(&config, true)
            .iter()
            .any(|w| w.contains(openai::API_KEY_VAR)));
    }

    #[test]
    fn percent_drops_trailing_zeros() {
        assert_eq!(percent(dec!(0.10)), "10%");
        assert_eq!(percent(dec!(0.025)), "2.5%");
    }
}
