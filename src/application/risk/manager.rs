//! Risk management service.
//!
//! The [`RiskManager`] is the single authority for committing and releasing
//! capital. It sizes positions, grants or rejects allocations atomically
//! against the [`CapitalLedger`], settles terminal executions, and holds
//! capital behind realized legging risk until it is resolved externally.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{error, info, warn};

use super::ledger::{CapitalLedger, RiskLimits};
use super::RiskCheckResult;
use crate::domain::{
    CapitalAllocation, ExposureMetrics, MarketId, Opportunity, OpportunityId, PnlSummary,
    StrategyKind, Usd,
};
use crate::error::RiskError;
use crate::port::{Event, Notifier};

/// Risk manager that sizes, grants and settles capital allocations.
///
/// Allocation checks run in this order: circuit breaker, size, duplicate
/// id, per-trade limit, total exposure, per-market exposure. All of them
/// and the reservation happen under one ledger lock.
pub struct RiskManager {
    ledger: CapitalLedger,
    notifier: Arc<dyn Notifier>,
}

impl RiskManager {
    pub fn new(limits: RiskLimits, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger: CapitalLedger::new(limits),
            notifier,
        }
    }

    #[must_use]
    pub const fn limits(&self) -> &RiskLimits {
        self.ledger.limits()
    }

    /// Largest position the current ledger allows for `opportunity`.
    ///
    /// The minimum of the per-trade cap, `liquidity_pct` of
    /// `available_liquidity`, total headroom, per-market headroom (scaled by
    /// the number of markets the allocation is split across) and the
    /// optional caller cap. Zero when any bound is saturated or the breaker
    /// is active. Rounded down to cents.
    #[must_use]
    pub fn calculate_position_size(
        &self,
        opportunity: &Opportunity,
        available_liquidity: Usd,
        max_allocation: Option<Usd>,
    ) -> Usd {
        if self.ledger.breaker().is_some() {
            return Decimal::ZERO;
        }

        let limits = self.ledger.limits();
        let markets = opportunity.markets();
        let (total_headroom, market_headroom) = self.ledger.headroom(&markets);
        let market_bound = market_headroom * Decimal::from(markets.len().max(1));

        let bounds = [
            Some(limits.per_trade_cap()),
            Some(available_liquidity * limits.liquidity_pct),
            Some(total_headroom),
            Some(market_bound),
            max_allocation,
        ];
        let size = bounds
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(Decimal::ZERO);

        if size <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        size.round_dp_with_strategy(2, RoundingStrategy::ToZero)
    }

    /// Atomically check every cap and reserve `amount`.
    pub fn allocate_capital(
        &self,
        opportunity_id: &OpportunityId,
        strategy: StrategyKind,
        markets: &[MarketId],
        amount: Usd,
    ) -> RiskCheckResult {
        match self
            .ledger
            .try_reserve(opportunity_id, strategy, markets, amount)
        {
            Ok(allocation) => {
                info!(
                    opportunity_id = %opportunity_id,
                    strategy = %strategy,
                    amount = %amount,
                    allocated = %self.ledger.allocated(),
                    "Capital allocated"
                );
                RiskCheckResult::Approved(allocation)
            }
            Err(e) => {
                warn!(
                    opportunity_id = %opportunity_id,
                    amount = %amount,
                    reason = %e,
                    "Allocation rejected"
                );
                RiskCheckResult::Rejected(e)
            }
        }
    }

    /// Settle a terminal execution: free its capital and record
    /// `realized_pnl` as one trade. `None` means no leg filled, so no trade
    /// is recorded.
    pub fn release(&self, allocation: &CapitalAllocation, realized_pnl: Option<Usd>) {
        match self.ledger.release(allocation.opportunity_id(), realized_pnl) {
            Ok(_) => info!(
                opportunity_id = %allocation.opportunity_id(),
                amount = %allocation.amount(),
                pnl = ?realized_pnl,
                "Capital released"
            ),
            Err(e) => warn!(
                opportunity_id = %allocation.opportunity_id(),
                error = %e,
                "Release of unknown allocation ignored"
            ),
        }
    }

    /// Keep capital reserved behind realized legging risk.
    ///
    /// Trips the circuit breaker when `halt_on_legging` is set. The capital
    /// stays held until [`resolve_legging`](Self::resolve_legging).
    pub fn hold(&self, allocation: &CapitalAllocation) {
        if let Err(e) = self.ledger.hold(allocation.opportunity_id()) {
            warn!(
                opportunity_id = %allocation.opportunity_id(),
                error = %e,
                "Hold of unknown allocation ignored"
            );
            return;
        }
        error!(
            opportunity_id = %allocation.opportunity_id(),
            amount = %allocation.amount(),
            "Capital held behind legging risk"
        );
        if self.ledger.limits().halt_on_legging {
            self.trigger_circuit_breaker(format!(
                "legging risk on {}",
                allocation.opportunity_id()
            ));
        }
    }

    /// External decision point for a held allocation: record the outcome of
    /// the manual unwind or hold-to-resolution and free the capital.
    ///
    /// Does not reset the circuit breaker.
    pub fn resolve_legging(
        &self,
        opportunity_id: &OpportunityId,
        realized_pnl: Usd,
    ) -> Result<(), RiskError> {
        let allocation = self.ledger.resolve_held(opportunity_id, realized_pnl)?;
        info!(
            opportunity_id = %opportunity_id,
            amount = %allocation.amount(),
            pnl = %realized_pnl,
            "Legging risk resolved"
        );
        Ok(())
    }

    /// Activate the circuit breaker, rejecting all new allocations.
    pub fn trigger_circuit_breaker(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!(reason = %reason, "Triggering circuit breaker");
        self.ledger.set_breaker(reason.clone());
        self.notifier
            .notify(Event::CircuitBreakerActivated { reason });
    }

    /// Deactivate the circuit breaker.
    pub fn reset_circuit_breaker(&self) {
        if self.ledger.clear_breaker() {
            info!("Resetting circuit breaker");
            self.notifier.notify(Event::CircuitBreakerReset);
        }
    }

    #[must_use]
    pub fn is_circuit_breaker_active(&self) -> bool {
        self.ledger.breaker().is_some()
    }

    /// Whether an allocation is outstanding (open or held) for this id.
    #[must_use]
    pub fn has_allocation(&self, opportunity_id: &OpportunityId) -> bool {
        self.ledger.contains(opportunity_id)
    }

    /// Whether this id is held behind legging risk.
    #[must_use]
    pub fn is_held(&self, opportunity_id: &OpportunityId) -> bool {
        self.ledger.is_held(opportunity_id)
    }

    /// Read-only exposure snapshot.
    #[must_use]
    pub fn get_exposure_metrics(&self) -> ExposureMetrics {
        self.ledger.metrics()
    }

    #[must_use]
    pub fn pnl_summary(&self) -> PnlSummary {
        self.ledger.pnl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::notifier::RecordingNotifier;
    use crate::domain::{Market, RebalanceDirection, Venue};
    use rust_decimal_macros::dec;

    fn manager() -> RiskManager {
        RiskManager::new(RiskLimits::default(), Arc::new(RecordingNotifier::new()))
    }

    fn opportunity(id: &str) -> Opportunity {
        let m = Market::try_new(id, Venue::new("polymarket"), "q", dec!(0.46), dec!(0.46)).unwrap();
        Opportunity::rebalancing(&m, dec!(-0.08), RebalanceDirection::Split)
    }

    fn allocate(rm: &RiskManager, opp: &Opportunity, amount: Usd) -> RiskCheckResult {
        rm.allocate_capital(opp.id(), opp.strategy(), &opp.markets(), amount)
    }

    #[test]
    fn size_is_bounded_by_per_trade_cap() {
        let rm = manager();
        let size = rm.calculate_position_size(&opportunity("m"), dec!(1000000), None);
        assert_eq!(size, dec!(1000));
    }

    #[test]
    fn size_is_bounded_by_liquidity() {
        let rm = manager();
        let size = rm.calculate_position_size(&opportunity("m"), dec!(301.555), None);
        assert_eq!(size, dec!(150.77));
    }

    #[test]
    fn size_honours_caller_cap() {
        let rm = manager();
        let size = rm.calculate_position_size(&opportunity("m"), dec!(1000000), Some(dec!(100)));
        assert_eq!(size, dec!(100));
    }

    #[test]
    fn size_is_zero_when_market_is_saturated() {
        let rm = manager();
        let market = [MarketId::new("m")];
        for id in ["x1", "x2"] {
            let result =
                rm.allocate_capital(&id.into(), StrategyKind::Rebalancing, &market, dec!(1000));
            assert!(result.is_approved());
        }

        assert_eq!(
            rm.calculate_position_size(&opportunity("m"), dec!(1000000), None),
            Decimal::ZERO
        );
        assert!(rm.calculate_position_size(&opportunity("other"), dec!(1000000), None) > Decimal::ZERO);
    }

    #[test]
    fn breaker_rejects_and_zeroes_size() {
        let rm = manager();
        rm.trigger_circuit_breaker("manual");

        assert_eq!(
            rm.calculate_position_size(&opportunity("m"), dec!(1000), None),
            Decimal::ZERO
        );
        let result = allocate(&rm, &opportunity("m"), dec!(10));
        assert!(matches!(
            result.rejection_error(),
            Some(RiskError::CircuitBreakerActive { .. })
        ));

        rm.reset_circuit_breaker();
        assert!(allocate(&rm, &opportunity("m"), dec!(10)).is_approved());
    }

    #[test]
    fn hold_trips_breaker_and_keeps_capital() {
        let rm = manager();
        let opp = opportunity("m");
        let RiskCheckResult::Approved(allocation) = allocate(&rm, &opp, dec!(500)) else {
            panic!("expected approval");
        };

        rm.hold(&allocation);

        assert!(rm.is_circuit_breaker_active());
        assert!(rm.is_held(opp.id()));
        assert_eq!(rm.get_exposure_metrics().total_exposure, dec!(500));

        rm.resolve_legging(opp.id(), dec!(-15)).unwrap();
        assert!(!rm.has_allocation(opp.id()));
        assert_eq!(rm.pnl_summary().overall.total_pnl, dec!(-15));
        assert!(rm.is_circuit_breaker_active());
    }

    #[test]
    fn resolving_unknown_legging_fails() {
        let rm = manager();
        assert!(matches!(
            rm.resolve_legging(&"nope".into(), Decimal::ZERO),
            Err(RiskError::UnknownAllocation { .. })
        ));
    }

    #[test]
    fn release_records_pnl_by_strategy() {
        let rm = manager();
        let opp = opportunity("m");
        let RiskCheckResult::Approved(allocation) = allocate(&rm, &opp, dec!(100)) else {
            panic!("expected approval");
        };

        rm.release(&allocation, Some(dec!(5.5)));
        rm.release(&allocation, Some(dec!(5.5)));

        let pnl = rm.pnl_summary();
        assert_eq!(pnl.overall.trades, 1);
        assert_eq!(pnl.by_strategy[&StrategyKind::Rebalancing].total_pnl, dec!(5.5));
        assert_eq!(rm.get_exposure_metrics().total_exposure, Decimal::ZERO);
    }

    #[test]
    fn release_without_fills_records_no_trade() {
        let rm = manager();
        let opp = opportunity("m");
        let RiskCheckResult::Approved(allocation) = allocate(&rm, &opp, dec!(100)) else {
            panic!("expected approval");
        };

        rm.release(&allocation, None);

        let pnl = rm.pnl_summary();
        assert_eq!(pnl.overall.trades, 0);
        assert!(!rm.has_allocation(opp.id()));
        assert_eq!(rm.get_exposure_metrics().total_exposure, Decimal::ZERO);
    }
}
