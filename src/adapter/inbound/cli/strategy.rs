//! Strategy listing and explanation.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::output;
use crate::domain::StrategyKind;
use crate::error::{ConfigError, Result};

struct StrategyInfo {
    kind: StrategyKind,
    signal: &'static str,
    legs: &'static str,
    summary: &'static str,
    details: &'static str,
}

const STRATEGIES: [StrategyInfo; 2] = [
    StrategyInfo {
        kind: StrategyKind::Rebalancing,
        signal: "YES + NO != $1",
        legs: "both outcomes of one market",
        summary: "Buys both sides when YES + NO < $1.00 or sells both when the sum exceeds $1.00",
        details: "Trades one market whose outcome prices do not sum to $1.00:

  YES + NO < $1.00   buy YES and NO (split), collect $1.00 at resolution
  YES + NO > $1.00   sell YES and NO (merge), owe $1.00 at resolution

Example:
  YES @ $0.46 + NO @ $0.46 = $0.92
  Raw spread = $0.08 per share, before fees, gas and slippage

Configuration:
  [strategies.rebalancing]
  min_deviation = 0.02   # ignore |YES + NO - 1| below this",
    },
    StrategyInfo {
        kind: StrategyKind::Combinatorial,
        signal: "related markets break price identity",
        legs: "one outcome on each of two markets",
        summary: "Classifies logically related market pairs and trades prices that violate the relationship",
        details: "Clusters market questions by embedding similarity, then asks a semantic
scorer how each pair relates:

  mutually exclusive   P(A) + P(B) <= 1     buy NO on both
  complementary        P(A) + P(B) = 1      buy YES on both below, NO on both above
  A implies B          P(A) <= P(B)         buy NO on A and YES on B

Pairs that resolve more than the temporal threshold apart, on different
sources, or with a drift risk above the limit are skipped.

Example:
  Market A: \"Will Candidate A win?\" @ $0.55
  Market B: \"Will Candidate B win?\" @ $0.55
  Exclusive, sum = $1.10: buy NO on both for $0.90

Requires OPENAI_API_KEY. Configuration:
  [strategies.combinatorial]
  min_mispricing = 0.02
  min_confidence = 0.85",
    },
];

#[derive(Tabled)]
struct StrategyRow {
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Signal")]
    signal: &'static str,
    #[tabled(rename = "Legs")]
    legs: &'static str,
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

fn find(name: &str) -> Option<&'static StrategyInfo> {
    let name = normalize(name);
    STRATEGIES.iter().find(|s| s.kind.name() == name)
}

fn available() -> Vec<&'static str> {
    STRATEGIES.iter().map(|s| s.kind.name()).collect()
}

/// List available strategies.
pub fn list() -> Result<()> {
    if output::is_json() {
        let strategies: Vec<_> = STRATEGIES
            .iter()
            .map(|s| {
                json!({
                    "name": s.kind.name(),
                    "signal": s.signal,
                    "legs": s.legs,
                })
            })
            .collect();
        output::json_output(json!({
            "command": "strategies.list",
            "strategies": strategies,
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Available strategies");
    let rows: Vec<StrategyRow> = STRATEGIES
        .iter()
        .map(|s| StrategyRow {
            name: s.kind.name(),
            signal: s.signal,
            legs: s.legs,
        })
        .collect();
    output::lines(&Table::new(rows).to_string());
    output::hint(&format!(
        "run {} for details",
        output::highlight("arbiter strategies explain <name>")
    ));
    Ok(())
}

/// Explain a specific strategy.
///
/// # Errors
///
/// Returns an error naming the available strategies when `name` is unknown.
pub fn explain(name: &str) -> Result<()> {
    let Some(info) = find(name) else {
        return Err(ConfigError::InvalidValue {
            field: "strategy",
            reason: format!(
                "unknown strategy {name:?}; available: {}",
                available().join(", ")
            ),
        }
        .into());
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "strategies.explain",
            "strategy": info.kind.name(),
            "summary": info.summary,
            "config_path": format!("strategies.{}", info.kind.name()),
        }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section(info.kind.name());
    output::lines(info.details);
    Ok(())
}
