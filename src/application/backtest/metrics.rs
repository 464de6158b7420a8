//! Performance statistics over a replayed trade list.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::money::to_f64;
use crate::domain::{OpportunityId, PnlSummary, StrategyKind, StrategyPnl, Usd};

/// One simulated fill-and-settle.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestTrade {
    pub at: DateTime<Utc>,
    pub opportunity_id: OpportunityId,
    pub strategy: StrategyKind,
    pub size: Usd,
    pub gross_profit: Usd,
    pub costs: Usd,
    pub pnl: Usd,
}

impl BacktestTrade {
    /// P&L as a fraction of the capital committed.
    #[must_use]
    pub fn return_pct(&self) -> f64 {
        if self.size.is_zero() {
            0.0
        } else {
            to_f64(self.pnl / self.size)
        }
    }
}

/// Equity after the trades of one snapshot settle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub at: DateTime<Utc>,
    pub equity: Usd,
}

/// Summary statistics for a backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestMetrics {
    pub snapshots: usize,
    pub opportunities: usize,
    pub trades: u64,
    pub winners: u64,
    pub losers: u64,
    pub win_rate: f64,
    pub total_pnl: Usd,
    pub average_pnl: Usd,
    pub starting_capital: Usd,
    pub ending_capital: Usd,
    pub max_drawdown: Usd,
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub max_drawdown_pct: f64,
    /// `None` with fewer than two trades or no return variance.
    pub sharpe_ratio: Option<f64>,
    /// `None` with fewer than two losing trades or no downside variance.
    pub sortino_ratio: Option<f64>,
    /// Gross wins over gross losses; `None` without a losing trade.
    pub profit_factor: Option<f64>,
    /// Total P&L over total capital committed.
    pub capital_efficiency: f64,
    pub by_strategy: HashMap<StrategyKind, StrategyPnl>,
}

impl BacktestMetrics {
    /// Compute metrics from settled trades and the equity curve they produced.
    ///
    /// Ratios annualize per-trade returns by `sqrt(periods_per_year)`.
    #[must_use]
    pub fn compute(
        trades: &[BacktestTrade],
        equity_curve: &[EquityPoint],
        starting_capital: Usd,
        periods_per_year: u32,
        snapshots: usize,
        opportunities: usize,
    ) -> Self {
        let mut pnl = PnlSummary::default();
        for trade in trades {
            pnl.overall.record(trade.pnl);
            pnl.by_strategy
                .entry(trade.strategy)
                .or_default()
                .record(trade.pnl);
        }

        let (max_drawdown, max_drawdown_pct) = max_drawdown(starting_capital, equity_curve);
        let returns: Vec<f64> = trades.iter().map(BacktestTrade::return_pct).collect();
        let annualize = f64::from(periods_per_year).sqrt();
        let committed: Usd = trades.iter().map(|t| t.size).sum();

        Self {
            snapshots,
            opportunities,
            trades: pnl.overall.trades,
            winners: pnl.overall.winners,
            losers: pnl.overall.losers,
            win_rate: pnl.overall.win_rate(),
            total_pnl: pnl.overall.total_pnl,
            average_pnl: pnl.overall.average_pnl(),
            starting_capital,
            ending_capital: equity_curve
                .last()
                .map_or(starting_capital, |point| point.equity),
            max_drawdown,
            max_drawdown_pct,
            sharpe_ratio: sharpe(&returns).map(|r| r * annualize),
            sortino_ratio: sortino(&returns).map(|r| r * annualize),
            profit_factor: profit_factor(trades),
            capital_efficiency: if committed.is_zero() {
                0.0
            } else {
                to_f64(pnl.overall.total_pnl / committed)
            },
            by_strategy: pnl.by_strategy,
        }
    }
}

fn max_drawdown(starting_capital: Usd, curve: &[EquityPoint]) -> (Usd, f64) {
    let mut peak = starting_capital;
    let mut worst = Decimal::ZERO;
    let mut worst_pct = 0.0_f64;
    for point in curve {
        peak = peak.max(point.equity);
        let drawdown = peak - point.equity;
        if drawdown > worst {
            worst = drawdown;
        }
        if peak > Decimal::ZERO {
            worst_pct = worst_pct.max(to_f64(drawdown / peak));
        }
    }
    (worst, worst_pct)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn sharpe(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let sd = std_dev(returns);
    (sd > 0.0).then(|| mean(returns) / sd)
}

fn sortino(returns: &[f64]) -> Option<f64> {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.len() < 2 {
        return None;
    }
    let sd = std_dev(&downside);
    (sd > 0.0).then(|| mean(returns) / sd)
}

fn profit_factor(trades: &[BacktestTrade]) -> Option<f64> {
    let wins: Usd = trades
        .iter()
        .map(|t| t.pnl)
        .filter(|p| *p > Decimal::ZERO)
        .sum();
    let losses: Usd = trades
        .iter()
        .map(|t| t.pnl)
        .filter(|p| *p < Decimal::ZERO)
        .sum();
    if losses.is_zero() {
        None
    } else {
        Some(to_f64(wins / -losses))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn trade(day: u32, strategy: StrategyKind, size: Usd, pnl: Usd) -> BacktestTrade {
        BacktestTrade {
            at: at(day),
            opportunity_id: OpportunityId::from(format!("opp-{day}").as_str()),
            strategy,
            size,
            gross_profit: pnl.max(Decimal::ZERO),
            costs: Decimal::ZERO,
            pnl,
        }
    }

    fn curve(start: Usd, trades: &[BacktestTrade]) -> Vec<EquityPoint> {
        let mut equity = start;
        trades
            .iter()
            .map(|t| {
                equity += t.pnl;
                EquityPoint { at: t.at, equity }
            })
            .collect()
    }

    #[test]
    fn empty_run_has_no_ratios() {
        let m = BacktestMetrics::compute(&[], &[], dec!(1000), 252, 3, 0);

        assert_eq!(m.trades, 0);
        assert_eq!(m.ending_capital, dec!(1000));
        assert_eq!(m.max_drawdown, Decimal::ZERO);
        assert!(m.sharpe_ratio.is_none());
        assert!(m.sortino_ratio.is_none());
        assert!(m.profit_factor.is_none());
        assert!(m.capital_efficiency.abs() < f64::EPSILON);
    }

    #[test]
    fn drawdown_is_measured_from_running_peak() {
        let trades = [
            trade(1, StrategyKind::Rebalancing, dec!(100), dec!(50)),
            trade(2, StrategyKind::Rebalancing, dec!(100), dec!(-30)),
            trade(3, StrategyKind::Rebalancing, dec!(100), dec!(-20)),
            trade(4, StrategyKind::Rebalancing, dec!(100), dec!(10)),
        ];
        let m = BacktestMetrics::compute(&trades, &curve(dec!(1000), &trades), dec!(1000), 252, 4, 4);

        assert_eq!(m.max_drawdown, dec!(50));
        assert!((m.max_drawdown_pct - 50.0 / 1050.0).abs() < 1e-12);
        assert_eq!(m.ending_capital, dec!(1010));
        assert_eq!(m.total_pnl, dec!(10));
    }

    #[test]
    fn win_rate_and_profit_factor() {
        let trades = [
            trade(1, StrategyKind::Rebalancing, dec!(100), dec!(6)),
            trade(2, StrategyKind::Combinatorial, dec!(100), dec!(-2)),
            trade(3, StrategyKind::Rebalancing, dec!(100), dec!(2)),
        ];
        let m = BacktestMetrics::compute(&trades, &curve(dec!(1000), &trades), dec!(1000), 252, 3, 3);

        assert_eq!(m.winners, 2);
        assert_eq!(m.losers, 1);
        assert!((m.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.profit_factor, Some(4.0));
        assert!((m.capital_efficiency - 6.0 / 300.0).abs() < 1e-12);
        assert_eq!(m.by_strategy[&StrategyKind::Rebalancing].trades, 2);
        assert_eq!(m.by_strategy[&StrategyKind::Combinatorial].total_pnl, dec!(-2));
    }

    #[test]
    fn sharpe_annualizes_mean_over_deviation() {
        let trades = [
            trade(1, StrategyKind::Rebalancing, dec!(100), dec!(3)),
            trade(2, StrategyKind::Rebalancing, dec!(100), dec!(1)),
        ];
        let m = BacktestMetrics::compute(&trades, &curve(dec!(1000), &trades), dec!(1000), 4, 2, 2);

        // returns 0.03 and 0.01: mean 0.02, population sd 0.01
        let sharpe = m.sharpe_ratio.unwrap();
        assert!((sharpe - 2.0 * 2.0).abs() < 1e-9);
        assert!(m.sortino_ratio.is_none());
    }

    #[test]
    fn identical_returns_have_no_sharpe() {
        let trades = [
            trade(1, StrategyKind::Rebalancing, dec!(100), dec!(2)),
            trade(2, StrategyKind::Rebalancing, dec!(100), dec!(2)),
        ];
        let m = BacktestMetrics::compute(&trades, &curve(dec!(1000), &trades), dec!(1000), 252, 2, 2);
        assert!(m.sharpe_ratio.is_none());
    }
}
