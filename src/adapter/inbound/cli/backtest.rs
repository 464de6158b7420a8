//! Handler for the `backtest` command: replay history, report metrics.

use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::BacktestArgs;
use crate::adapter::inbound::cli::output;
use crate::application::backtest::{BacktestMetrics, BacktestTrade};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::logging::LogFormat;
use crate::infrastructure::config::Config;

#[derive(Tabled)]
struct TradeRow {
    #[tabled(rename = "Time")]
    at: String,
    #[tabled(rename = "Strategy")]
    strategy: &'static str,
    #[tabled(rename = "Opportunity")]
    opportunity: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Costs")]
    costs: String,
    #[tabled(rename = "P&L")]
    pnl: String,
}

impl From<&BacktestTrade> for TradeRow {
    fn from(trade: &BacktestTrade) -> Self {
        Self {
            at: trade.at.format("%Y-%m-%d %H:%M").to_string(),
            strategy: trade.strategy.name(),
            opportunity: trade.opportunity_id.to_string(),
            size: format!("${:.2}", trade.size),
            costs: format!("${:.2}", trade.costs),
            pnl: output::signed(trade.pnl),
        }
    }
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Execute the backtest command.
pub async fn execute(args: &BacktestArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;
    if let Some(history) = &args.history {
        config.backtest.history.clone_from(history);
    }
    if output::is_json() {
        config.logging.format = LogFormat::Json;
    }
    config.init_logging();

    let (backtester, snapshots) = bootstrap::build_backtest(&config)?;
    let report = backtester.run(&snapshots).await;

    if output::is_json() {
        output::json_output(json!({
            "command": "backtest",
            "history": config.backtest.history.display().to_string(),
            "metrics": serde_json::to_value(&report.metrics)?,
            "trades": serde_json::to_value(&report.trades)?,
            "equity_curve": serde_json::to_value(&report.equity_curve)?,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    print_metrics(&report.metrics);

    if args.trades && !report.trades.is_empty() {
        output::section("Trades");
        let rows: Vec<TradeRow> = report.trades.iter().map(TradeRow::from).collect();
        output::lines(&Table::new(rows).to_string());
    }
    if report.metrics.trades == 0 {
        output::note("No trades in the replayed history");
    }
    Ok(())
}

fn print_metrics(m: &BacktestMetrics) {
    output::section("Replay");
    output::field("Snapshots", m.snapshots);
    output::field("Opportunities", m.opportunities);
    output::field("Trades", m.trades);

    output::section("Performance");
    output::field("Win rate", percent(m.win_rate));
    output::field("Total P&L", output::signed(m.total_pnl));
    output::field("Average P&L", output::signed(m.average_pnl));
    output::field(
        "Capital",
        format!("${:.2} -> ${:.2}", m.starting_capital, m.ending_capital),
    );
    output::field("Capital efficiency", percent(m.capital_efficiency));
    output::field("Profit factor", ratio(m.profit_factor));

    output::section("Risk");
    output::field(
        "Max drawdown",
        format!("${:.2} ({})", m.max_drawdown, percent(m.max_drawdown_pct)),
    );
    output::field("Sharpe", ratio(m.sharpe_ratio));
    output::field("Sortino", ratio(m.sortino_ratio));

    if m.by_strategy.len() > 1 {
        output::section("By strategy");
        let mut strategies: Vec<_> = m.by_strategy.iter().collect();
        strategies.sort_by_key(|(kind, _)| kind.name());
        for (kind, pnl) in strategies {
            output::field(
                kind.name(),
                format!(
                    "{} trades, {} ({})",
                    pnl.trades,
                    output::signed(pnl.total_pnl),
                    percent(pnl.win_rate())
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OpportunityId, StrategyKind};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn trade_row_formats_money() {
        let trade = BacktestTrade {
            at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            opportunity_id: OpportunityId::from("rain"),
            strategy: StrategyKind::Rebalancing,
            size: dec!(100),
            gross_profit: dec!(7.4),
            costs: dec!(2.0045),
            pnl: dec!(5.3955),
        };

        let row = TradeRow::from(&trade);

        assert_eq!(row.at, "2026-03-01 12:00");
        assert_eq!(row.strategy, "rebalancing");
        assert_eq!(row.size, "$100.00");
        assert_eq!(row.costs, "$2.00");
    }

    #[test]
    fn missing_ratio_prints_placeholder() {
        assert_eq!(ratio(None), "n/a");
        assert_eq!(ratio(Some(1.234)), "1.23");
        assert_eq!(percent(0.5), "50.00%");
    }
}
