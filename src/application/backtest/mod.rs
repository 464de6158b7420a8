//! Historical replay of the scan, gate and sizing path.
//!
//! Each [`MarketSnapshot`] goes through the same detectors, profitability
//! gate, ranking and risk sizing as a live cycle. Approved allocations are
//! assumed to fill at the quoted basket price, so a trade's P&L is the
//! analyzer's net profit at the allocated size. Capital is released when
//! the snapshot's trades settle.

pub mod metrics;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::application::pipeline::PipelineConfig;
use crate::application::profitability::ProfitabilityAnalyzer;
use crate::application::risk::{RiskCheckResult, RiskManager};
use crate::application::scanner::{rank_profitable, OpportunityScanner};
use crate::domain::{MarketSnapshot, Usd};
use crate::error::ConfigError;

pub use metrics::{BacktestMetrics, BacktestTrade, EquityPoint};

/// Replay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// TOML file of chronological market snapshots.
    #[serde(default = "default_history")]
    pub history: PathBuf,
    /// Trading periods per year used to annualize Sharpe and Sortino.
    #[serde(default = "default_periods_per_year")]
    pub periods_per_year: u32,
}

fn default_history() -> PathBuf {
    PathBuf::from("history.toml")
}

const fn default_periods_per_year() -> u32 {
    252
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            history: default_history(),
            periods_per_year: default_periods_per_year(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods_per_year == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backtest.periods_per_year",
                reason: "must be greater than 0".into(),
            });
        }
        Ok(())
    }
}

/// Outcome of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub metrics: BacktestMetrics,
    pub trades: Vec<BacktestTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Replays snapshots through scan, gate, rank and allocation.
pub struct Backtester {
    scanner: OpportunityScanner,
    analyzer: ProfitabilityAnalyzer,
    risk: Arc<RiskManager>,
    pipeline: PipelineConfig,
    config: BacktestConfig,
}

impl Backtester {
    pub fn new(
        scanner: OpportunityScanner,
        analyzer: ProfitabilityAnalyzer,
        risk: Arc<RiskManager>,
        pipeline: PipelineConfig,
        config: BacktestConfig,
    ) -> Self {
        Self {
            scanner,
            analyzer,
            risk,
            pipeline,
            config,
        }
    }

    /// Replay `snapshots` in the order given.
    pub async fn run(&self, snapshots: &[MarketSnapshot]) -> BacktestReport {
        let starting_capital = self.risk.limits().total_capital;
        let mut equity = starting_capital;
        let mut trades = Vec::new();
        let mut equity_curve = Vec::with_capacity(snapshots.len());
        let mut opportunities = 0;

        for snapshot in snapshots {
            let candidates = self.scanner.scan(&snapshot.markets).await;
            let ranked = rank_profitable(
                &self.analyzer,
                candidates,
                &snapshot.books,
                self.pipeline.nominal_size,
                self.pipeline.max_opportunities,
            );
            opportunities += ranked.len();

            let mut settled = Vec::new();
            for candidate in &ranked {
                let opportunity = &candidate.opportunity;
                let size = self.risk.calculate_position_size(
                    opportunity,
                    opportunity.min_liquidity(),
                    Some(candidate.analysis.position_size),
                );
                let allocation = match self.risk.allocate_capital(
                    opportunity.id(),
                    opportunity.strategy(),
                    &opportunity.markets(),
                    size,
                ) {
                    RiskCheckResult::Approved(allocation) => allocation,
                    RiskCheckResult::Rejected(e) => {
                        debug!(opportunity_id = %opportunity.id(), reason = %e, "Replay allocation rejected");
                        continue;
                    }
                };

                let analysis = self.analyzer.analyze(opportunity, &snapshot.books, size);
                settled.push((
                    allocation,
                    BacktestTrade {
                        at: snapshot.at,
                        opportunity_id: opportunity.id().clone(),
                        strategy: opportunity.strategy(),
                        size,
                        gross_profit: analysis.gross_profit,
                        costs: analysis.costs.total(),
                        pnl: analysis.net_profit,
                    },
                ));
            }

            for (allocation, trade) in settled {
                self.risk.release(&allocation, Some(trade.pnl));
                equity += trade.pnl;
                trades.push(trade);
            }
            equity_curve.push(EquityPoint {
                at: snapshot.at,
                equity,
            });
        }

        let metrics = BacktestMetrics::compute(
            &trades,
            &equity_curve,
            starting_capital,
            self.config.periods_per_year,
            snapshots.len(),
            opportunities,
        );
        info!(
            snapshots = metrics.snapshots,
            trades = metrics.trades,
            total_pnl = %metrics.total_pnl,
            win_rate = metrics.win_rate,
            max_drawdown = %metrics.max_drawdown,
            "Backtest complete"
        );
        BacktestReport {
            metrics,
            trades,
            equity_curve,
        }
    }

    /// Capital the replay started from.
    #[must_use]
    pub fn starting_capital(&self) -> Usd {
        self.risk.limits().total_capital
    }
}
