//! Handler for the `scan` command: one detection pass, no trading.

use rust_decimal::Decimal;
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::ScanArgs;
use crate::adapter::inbound::cli::output;
use crate::application::scanner::RankedOpportunity;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::Config;

#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Strategy")]
    strategy: &'static str,
    #[tabled(rename = "Spread")]
    spread: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Net %")]
    net_pct: String,
    #[tabled(rename = "Opportunity")]
    summary: String,
}

impl OpportunityRow {
    fn new(rank: usize, ranked: &RankedOpportunity) -> Self {
        let analysis = &ranked.analysis;
        Self {
            rank,
            strategy: ranked.opportunity.strategy().name(),
            spread: format!("{:.4}", ranked.opportunity.raw_spread()),
            size: format!("${:.2}", analysis.position_size),
            net: format!("${:.2}", analysis.net_profit),
            net_pct: format!("{:.2}%", analysis.net_profit_pct * Decimal::ONE_HUNDRED),
            summary: ranked.opportunity.summary().to_string(),
        }
    }
}

/// Execute the scan command.
pub async fn execute(args: &ScanArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if let Some(limit) = args.limit {
        config.scanner.max_opportunities = limit;
    }
    if output::is_json() {
        config.logging.format = LogFormat::Json;
    }
    config.validate()?;
    config.init_logging();

    let pipeline = bootstrap::build_pipeline(&config)?;
    let ranked = pipeline.scan().await?;

    if output::is_json() {
        output::json_output(json!({
            "command": "scan",
            "opportunities": serde_json::to_value(&ranked)?,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Opportunities");
    if ranked.is_empty() {
        output::note("No profitable opportunities");
        return Ok(());
    }

    let rows: Vec<OpportunityRow> = ranked
        .iter()
        .enumerate()
        .map(|(i, r)| OpportunityRow::new(i + 1, r))
        .collect();
    output::lines(&Table::new(rows).to_string());

    if output::verbosity() > 0 {
        print_details(&ranked);
    }
    output::hint("run `arbiter run` to trade them");
    Ok(())
}

fn print_details(ranked: &[RankedOpportunity]) {
    for r in ranked {
        let analysis = &r.analysis;
        output::section(r.opportunity.id().as_str());
        output::field("Venue fees", format!("${:.4}", analysis.costs.venue_fee));
        output::field("Network", format!("${:.4}", analysis.costs.network));
        output::field("Slippage", format!("${:.4}", analysis.costs.slippage));
        output::field("Break-even", format!("{:.4}", analysis.break_even_spread));
        output::field("Required", format!("{:.4}", analysis.min_required_spread));
        for factor in &analysis.risk_factors {
            output::warning(&factor.to_string());
        }
    }
}
