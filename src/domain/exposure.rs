//! Read-only exposure and P&L reporting types.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::MarketId;
use super::money::Usd;
use super::opportunity::StrategyKind;

/// What concentration is measured over when scoring diversification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiversificationWeighting {
    /// Weight each market by dollars exposed.
    #[default]
    Dollar,
    /// Weight each market by number of open allocations touching it.
    Count,
}

/// Snapshot of the capital ledger.
#[derive(Debug, Clone, Serialize)]
pub struct ExposureMetrics {
    pub total_capital: Usd,
    /// Capital reserved by open and held allocations.
    pub total_exposure: Usd,
    pub available_capital: Usd,
    pub per_market: HashMap<MarketId, Usd>,
    pub per_strategy: HashMap<StrategyKind, Usd>,
    pub max_single_market_exposure: Usd,
    pub open_allocations: usize,
    /// Allocations kept reserved because of realized legging risk.
    pub held_allocations: usize,
    /// `1 - HHI` over market weights; 1.0 when nothing is exposed.
    pub diversification_score: f64,
    pub weighting: DiversificationWeighting,
}

/// Realized P&L attribution for one strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyPnl {
    pub trades: u64,
    pub winners: u64,
    pub losers: u64,
    pub total_pnl: Usd,
}

impl StrategyPnl {
    /// Record one closed trade.
    pub fn record(&mut self, pnl: Usd) {
        self.trades += 1;
        self.total_pnl += pnl;
        if pnl > Decimal::ZERO {
            self.winners += 1;
        } else if pnl < Decimal::ZERO {
            self.losers += 1;
        }
    }

    /// Winning trades as a fraction of all trades.
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.trades == 0 {
            0.0
        } else {
            self.winners as f64 / self.trades as f64
        }
    }

    #[must_use]
    pub fn average_pnl(&self) -> Usd {
        if self.trades == 0 {
            Decimal::ZERO
        } else {
            self.total_pnl / Decimal::from(self.trades)
        }
    }
}

/// Realized P&L across strategies.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PnlSummary {
    pub overall: StrategyPnl,
    pub by_strategy: HashMap<StrategyKind, StrategyPnl>,
}

/// Normalized Herfindahl diversification over a set of weights.
///
/// Returns `1 - Σ sᵢ²` where `sᵢ` is each weight's share of the total.
/// Non-positive weights are ignored; an empty set scores 1.0.
#[must_use]
pub fn diversification_score<I>(weights: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let weights: Vec<f64> = weights.into_iter().filter(|w| *w > 0.0).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 1.0;
    }
    let hhi: f64 = weights.iter().map(|w| (w / total).powi(2)).sum();
    (1.0 - hhi).clamp(0.0, 1.0)
}
