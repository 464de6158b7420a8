//! Shared capital ledger.
//!
//! The ledger is the single mutable resource shared by every concurrent
//! evaluation. All reads and writes go through one mutex, so a
//! check-and-reserve is serializable: two allocations can never both pass
//! a cap check that only one of them fits under.

use std::collections::HashMap;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::exposure::diversification_score;
use crate::domain::money::to_f64;
use crate::domain::{
    CapitalAllocation, DiversificationWeighting, ExposureMetrics, MarketId, OpportunityId,
    PnlSummary, StrategyKind, Usd,
};
use crate::error::RiskError;

/// Exposure limits, all as fractions of total capital except the capital itself.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLimits {
    pub total_capital: Usd,
    /// Largest single allocation.
    pub max_position_pct: Decimal,
    /// Largest exposure to one market across allocations.
    pub max_market_pct: Decimal,
    /// Largest exposure across all allocations.
    pub max_total_pct: Decimal,
    /// Share of on-venue liquidity a position may consume.
    pub liquidity_pct: Decimal,
    pub weighting: DiversificationWeighting,
    /// Trip the circuit breaker when legging risk is realized.
    pub halt_on_legging: bool,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            total_capital: dec!(10000),
            max_position_pct: dec!(0.10),
            max_market_pct: dec!(0.20),
            max_total_pct: dec!(0.80),
            liquidity_pct: dec!(0.50),
            weighting: DiversificationWeighting::Dollar,
            halt_on_legging: true,
        }
    }
}

impl RiskLimits {
    #[must_use]
    pub fn per_trade_cap(&self) -> Usd {
        self.total_capital * self.max_position_pct
    }

    #[must_use]
    pub fn market_cap(&self) -> Usd {
        self.total_capital * self.max_market_pct
    }

    #[must_use]
    pub fn total_cap(&self) -> Usd {
        self.total_capital * self.max_total_pct
    }
}

/// Amounts at or below this are treated as fully released.
const RESIDUE: Decimal = Decimal::from_parts(1, 0, 0, false, 12);

#[derive(Debug, Default)]
struct LedgerState {
    open: HashMap<OpportunityId, CapitalAllocation>,
    held: HashMap<OpportunityId, CapitalAllocation>,
    allocated: Usd,
    market_exposure: HashMap<MarketId, Usd>,
    market_positions: HashMap<MarketId, usize>,
    strategy_exposure: HashMap<StrategyKind, Usd>,
    pnl: PnlSummary,
    breaker: Option<String>,
}

impl LedgerState {
    fn add(&mut self, allocation: &CapitalAllocation) {
        let per_market = allocation.per_market_amount();
        self.allocated += allocation.amount();
        for market in allocation.markets() {
            *self.market_exposure.entry(market.clone()).or_default() += per_market;
            *self.market_positions.entry(market.clone()).or_default() += 1;
        }
        *self
            .strategy_exposure
            .entry(allocation.strategy())
            .or_default() += allocation.amount();
    }

    fn remove(&mut self, allocation: &CapitalAllocation) {
        let per_market = allocation.per_market_amount();
        self.allocated = (self.allocated - allocation.amount()).max(Decimal::ZERO);
        if self.allocated <= RESIDUE {
            self.allocated = Decimal::ZERO;
        }
        for market in allocation.markets() {
            subtract(&mut self.market_exposure, market, per_market);
            if let Some(count) = self.market_positions.get_mut(market) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.market_positions.remove(market);
                }
            }
        }
        subtract(
            &mut self.strategy_exposure,
            &allocation.strategy(),
            allocation.amount(),
        );
    }

    fn record_pnl(&mut self, strategy: StrategyKind, pnl: Usd) {
        self.pnl.overall.record(pnl);
        self.pnl.by_strategy.entry(strategy).or_default().record(pnl);
    }

    fn contains(&self, id: &OpportunityId) -> bool {
        self.open.contains_key(id) || self.held.contains_key(id)
    }
}

fn subtract<K: std::hash::Hash + Eq + Clone>(map: &mut HashMap<K, Usd>, key: &K, amount: Usd) {
    if let Some(value) = map.get_mut(key) {
        *value -= amount;
        if *value <= RESIDUE {
            map.remove(key);
        }
    }
}

/// Capital ledger with serializable reserve and release.
#[derive(Debug)]
pub struct CapitalLedger {
    limits: RiskLimits,
    state: Mutex<LedgerState>,
}

impl CapitalLedger {
    #[must_use]
    pub fn new(limits: RiskLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(LedgerState::default()),
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    /// Check every cap and reserve `amount` in one critical section.
    pub fn try_reserve(
        &self,
        opportunity_id: &OpportunityId,
        strategy: StrategyKind,
        markets: &[MarketId],
        amount: Usd,
    ) -> Result<CapitalAllocation, RiskError> {
        let mut state = self.state.lock();

        if let Some(reason) = &state.breaker {
            return Err(RiskError::CircuitBreakerActive {
                reason: reason.clone(),
            });
        }
        if amount <= Decimal::ZERO {
            return Err(RiskError::NonPositiveSize { requested: amount });
        }
        if state.contains(opportunity_id) {
            return Err(RiskError::DuplicateAllocation {
                opportunity_id: opportunity_id.to_string(),
            });
        }

        let per_trade = self.limits.per_trade_cap();
        if amount > per_trade {
            return Err(RiskError::PositionLimitExceeded {
                requested: amount,
                limit: per_trade,
            });
        }

        let total_cap = self.limits.total_cap();
        if state.allocated + amount > total_cap {
            return Err(RiskError::ExposureLimitExceeded {
                current: state.allocated,
                additional: amount,
                limit: total_cap,
            });
        }

        let allocation = CapitalAllocation::new(
            opportunity_id.clone(),
            strategy,
            amount,
            markets.to_vec(),
        );
        let per_market = allocation.per_market_amount();
        let market_cap = self.limits.market_cap();
        for market in markets {
            let current = state
                .market_exposure
                .get(market)
                .copied()
                .unwrap_or_default();
            if current + per_market > market_cap {
                return Err(RiskError::MarketExposureExceeded {
                    market_id: market.to_string(),
                    current,
                    additional: per_market,
                    limit: market_cap,
                });
            }
        }

        state.add(&allocation);
        state.open.insert(opportunity_id.clone(), allocation.clone());
        Ok(allocation)
    }

    /// Free an open allocation. `pnl` is `None` when nothing traded, which
    /// leaves the P&L record untouched.
    pub fn release(
        &self,
        opportunity_id: &OpportunityId,
        pnl: Option<Usd>,
    ) -> Result<CapitalAllocation, RiskError> {
        let mut state = self.state.lock();
        let allocation = state.open.remove(opportunity_id).ok_or_else(|| {
            RiskError::UnknownAllocation {
                opportunity_id: opportunity_id.to_string(),
            }
        })?;
        state.remove(&allocation);
        if let Some(pnl) = pnl {
            state.record_pnl(allocation.strategy(), pnl);
        }
        Ok(allocation)
    }

    /// Move an open allocation to held. Its exposure stays reserved.
    pub fn hold(&self, opportunity_id: &OpportunityId) -> Result<(), RiskError> {
        let mut state = self.state.lock();
        let allocation = state.open.remove(opportunity_id).ok_or_else(|| {
            RiskError::UnknownAllocation {
                opportunity_id: opportunity_id.to_string(),
            }
        })?;
        state.held.insert(opportunity_id.clone(), allocation);
        Ok(())
    }

    /// Free a held allocation once its exposure has been resolved externally.
    pub fn resolve_held(&self, opportunity_id: &OpportunityId, pnl: Usd) -> Result<CapitalAllocation, RiskError> {
        let mut state = self.state.lock();
        let allocation = state.held.remove(opportunity_id).ok_or_else(|| {
            RiskError::UnknownAllocation {
                opportunity_id: opportunity_id.to_string(),
            }
        })?;
        state.remove(&allocation);
        state.record_pnl(allocation.strategy(), pnl);
        Ok(allocation)
    }

    #[must_use]
    pub fn contains(&self, opportunity_id: &OpportunityId) -> bool {
        self.state.lock().contains(opportunity_id)
    }

    #[must_use]
    pub fn is_held(&self, opportunity_id: &OpportunityId) -> bool {
        self.state.lock().held.contains_key(opportunity_id)
    }

    pub fn set_breaker(&self, reason: String) {
        self.state.lock().breaker = Some(reason);
    }

    /// Clear the breaker. Returns whether it was set.
    pub fn clear_breaker(&self) -> bool {
        self.state.lock().breaker.take().is_some()
    }

    #[must_use]
    pub fn breaker(&self) -> Option<String> {
        self.state.lock().breaker.clone()
    }

    #[must_use]
    pub fn allocated(&self) -> Usd {
        self.state.lock().allocated
    }

    /// Remaining room under the total cap, and the tightest per-market room
    /// among `markets`.
    #[must_use]
    pub fn headroom(&self, markets: &[MarketId]) -> (Usd, Usd) {
        let state = self.state.lock();
        let total = self.limits.total_cap() - state.allocated;
        let market_cap = self.limits.market_cap();
        let market = markets
            .iter()
            .map(|m| market_cap - state.market_exposure.get(m).copied().unwrap_or_default())
            .min()
            .unwrap_or(market_cap);
        (total, market)
    }

    #[must_use]
    pub fn metrics(&self) -> ExposureMetrics {
        let state = self.state.lock();
        let weights: Vec<f64> = match self.limits.weighting {
            DiversificationWeighting::Dollar => {
                state.market_exposure.values().copied().map(to_f64).collect()
            }
            DiversificationWeighting::Count => {
                state.market_positions.values().map(|c| *c as f64).collect()
            }
        };

        ExposureMetrics {
            total_capital: self.limits.total_capital,
            total_exposure: state.allocated,
            available_capital: self.limits.total_capital - state.allocated,
            per_market: state.market_exposure.clone(),
            per_strategy: state.strategy_exposure.clone(),
            max_single_market_exposure: state
                .market_exposure
                .values()
                .copied()
                .max()
                .unwrap_or_default(),
            open_allocations: state.open.len(),
            held_allocations: state.held.len(),
            diversification_score: diversification_score(weights),
            weighting: self.limits.weighting,
        }
    }

    #[must_use]
    pub fn pnl(&self) -> PnlSummary {
        self.state.lock().pnl.clone()
    }
}
