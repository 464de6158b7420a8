//! Two-leg execution engine.
//!
//! Leg 1 is always the less liquid leg. Leg 2 is submitted only after leg 1
//! has filled, and is sized to what leg 1 actually filled. Every wait races
//! the venue's update stream against a deadline; nothing busy-polls. When
//! the stream drops updates, or a cancel goes unacknowledged, the order is
//! reconciled against the venue's own status before anything is decided.
//!
//! Outcomes settle against the [`RiskManager`]:
//!
//! - `Completed`: P&L from fill prices, capital released
//! - `Cancelled`: no trade recorded, capital released, late fills watched
//! - `Leg2TimeoutFailed`: capital held, legging risk escalated
//!
//! A leg 1 whose fill state cannot be confirmed also holds its capital.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::{Decimal, RoundingStrategy};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use super::pnl::realized_pnl;
use super::ExecutionConfig;
use crate::application::profitability::{NetworkCostConfig, VenueFees};
use crate::application::risk::RiskManager;
use crate::domain::{
    CapitalAllocation, DomainError, Execution, ExecutionEvent, ExecutionState, Fill, Leg,
    Opportunity, Order, OrderId, OrderSide, Usd, Volume,
};
use crate::error::VenueError;
use crate::port::{Event, ExecutionReport, LeggingEvent, Notifier, OrderClient, OrderUpdate};

/// How a wait on one order ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegWait {
    Filled,
    /// The venue will not fill the order any further.
    Closed,
    /// Still open when the deadline passed.
    Deadline,
    /// Updates were lost and the venue could not be asked.
    Unknown,
}

/// Executes opportunities as atomic two-leg trades.
///
/// Engines are cheap to share; concurrent executions for different
/// opportunities are independent apart from the risk ledger.
pub struct ExecutionEngine {
    client: Arc<dyn OrderClient>,
    risk: Arc<RiskManager>,
    notifier: Arc<dyn Notifier>,
    fees: VenueFees,
    network: NetworkCostConfig,
    config: ExecutionConfig,
}

impl ExecutionEngine {
    pub fn new(
        client: Arc<dyn OrderClient>,
        risk: Arc<RiskManager>,
        notifier: Arc<dyn Notifier>,
        fees: VenueFees,
        network: NetworkCostConfig,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            client,
            risk,
            notifier,
            fees,
            network,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Execute `opportunity` with the capital reserved in `allocation`.
    ///
    /// Returns a terminal execution, or an error when the opportunity cannot
    /// be turned into orders (allocation released) or leg 1's fill state
    /// cannot be confirmed (allocation held).
    pub async fn execute(
        &self,
        opportunity: &Opportunity,
        allocation: CapitalAllocation,
    ) -> Result<Execution, DomainError> {
        let mut execution = match self.prepare(opportunity, allocation.amount()) {
            Ok(execution) => execution,
            Err(e) => {
                warn!(opportunity_id = %opportunity.id(), error = %e, "Cannot build orders");
                self.risk.release(&allocation, None);
                return Err(e);
            }
        };

        info!(
            execution_id = %execution.id(),
            opportunity_id = %opportunity.id(),
            leg1_market = %execution.leg1().market_id(),
            leg2_market = %execution.leg2().market_id(),
            shares = %execution.leg1().size(),
            "Execution started"
        );

        // Subscribe before the first submit so no update can be missed.
        let mut updates = self.client.subscribe();

        if let Err(e) = self.drive(&mut execution, &mut updates).await {
            error!(execution_id = %execution.id(), error = %e, "Execution aborted");
            let exposed = execution.leg1().filled_size() > Decimal::ZERO
                || matches!(e, DomainError::OrderStateUnknown { .. });
            if exposed {
                self.risk.hold(&allocation);
            } else {
                self.risk.release(&allocation, None);
            }
            return Err(e);
        }

        self.settle(&mut execution, &allocation, updates);
        Ok(execution)
    }

    fn prepare(&self, opportunity: &Opportunity, size: Usd) -> Result<Execution, DomainError> {
        let [a, b] = opportunity.legs() else {
            return Err(DomainError::UnsupportedLegCount {
                count: opportunity.legs().len(),
            });
        };
        let (thin, deep) = if b.liquidity < a.liquidity { (b, a) } else { (a, b) };
        let shares = opportunity
            .shares_for(size)
            .round_dp_with_strategy(2, RoundingStrategy::ToZero);

        Ok(Execution::new(
            opportunity.id().clone(),
            opportunity.strategy(),
            self.order_for(thin, shares)?,
            self.order_for(deep, shares)?,
        ))
    }

    /// Limit order for `leg`, allowing `limit_slippage` past the quote.
    fn order_for(&self, leg: &Leg, shares: Volume) -> Result<Order, DomainError> {
        let allowance = leg.price * self.config.limit_slippage;
        let limit = match leg.side {
            OrderSide::Buy => (leg.price + allowance).min(Decimal::ONE),
            OrderSide::Sell => (leg.price - allowance).max(Decimal::ZERO),
        };
        Order::try_new(
            leg.market_id.clone(),
            leg.venue.clone(),
            leg.outcome,
            leg.side,
            limit.round_dp(4),
            shares,
        )
    }

    /// Run the state machine until it reaches a terminal state.
    async fn drive(
        &self,
        execution: &mut Execution,
        updates: &mut broadcast::Receiver<OrderUpdate>,
    ) -> Result<(), DomainError> {
        if !self.submit_leg1(execution).await? {
            return Ok(());
        }

        let deadline = Instant::now() + self.config.leg_timeout();
        match self.wait_for_fill(updates, execution.leg1_mut(), deadline).await {
            LegWait::Filled => {
                transition(execution, ExecutionEvent::Filled)?;
            }
            LegWait::Unknown => return Err(unknown_state(execution.leg1())),
            wait => {
                transition(execution, ExecutionEvent::DeadlineElapsed)?;
                if !self.cancel_leg1(execution, updates, wait).await? {
                    return Ok(());
                }
            }
        }

        let hedge = execution.leg1().filled_size();
        if hedge < execution.leg2().size() {
            execution.leg2_mut().resize(hedge);
            info!(
                execution_id = %execution.id(),
                size = %hedge,
                "Leg 2 resized to leg 1 fill"
            );
        }

        match self.client.submit(execution.leg2()).await {
            Ok(order_id) => {
                execution.leg2_mut().mark_submitted(order_id);
                transition(execution, ExecutionEvent::Submitted)?;
            }
            Err(e) => {
                warn!(execution_id = %execution.id(), error = %e, "Leg 2 submission failed");
                execution.leg2_mut().mark_rejected();
                transition(execution, ExecutionEvent::SubmitFailed)?;
                return Ok(());
            }
        }

        let deadline = Instant::now() + self.config.leg_timeout();
        let mut outcome = self.wait_for_fill(updates, execution.leg2_mut(), deadline).await;
        let cancelled = outcome == LegWait::Deadline;
        if cancelled {
            outcome = self.cancel_and_confirm(updates, execution.leg2_mut()).await;
        }

        match outcome {
            LegWait::Filled => {
                if cancelled {
                    info!(execution_id = %execution.id(), "Leg 2 filled before cancel acknowledgement");
                }
                transition(execution, ExecutionEvent::Filled)?;
            }
            LegWait::Closed if cancelled => {
                execution.leg2_mut().mark_cancelled();
                transition(execution, ExecutionEvent::DeadlineElapsed)?;
            }
            LegWait::Closed => {
                execution.leg2_mut().mark_rejected();
                transition(execution, ExecutionEvent::DeadlineElapsed)?;
            }
            LegWait::Deadline | LegWait::Unknown => {
                execution.leg2_mut().mark_expired();
                transition(execution, ExecutionEvent::DeadlineElapsed)?;
            }
        }
        Ok(())
    }

    /// Submit leg 1. Returns false when the venue refused it.
    async fn submit_leg1(&self, execution: &mut Execution) -> Result<bool, DomainError> {
        match self.client.submit(execution.leg1()).await {
            Ok(order_id) => {
                execution.leg1_mut().mark_submitted(order_id);
                transition(execution, ExecutionEvent::Submitted)?;
                Ok(true)
            }
            Err(e) => {
                warn!(execution_id = %execution.id(), error = %e, "Leg 1 submission failed");
                execution.leg1_mut().mark_rejected();
                transition(execution, ExecutionEvent::SubmitFailed)?;
                Ok(false)
            }
        }
    }

    /// Resolve a leg 1 deadline. Returns true when leg 1 holds a fill that
    /// leg 2 must hedge.
    ///
    /// A fill observed before the cancel acknowledgement wins; once the ack
    /// is observed, later fills are inconsistencies for the watcher.
    async fn cancel_leg1(
        &self,
        execution: &mut Execution,
        updates: &mut broadcast::Receiver<OrderUpdate>,
        wait: LegWait,
    ) -> Result<bool, DomainError> {
        let outcome = if wait == LegWait::Deadline {
            self.cancel_and_confirm(updates, execution.leg1_mut()).await
        } else {
            wait
        };

        let filled = execution.leg1().filled_size();
        match outcome {
            LegWait::Filled => {
                info!(execution_id = %execution.id(), "Leg 1 filled before cancel acknowledgement");
                transition(execution, ExecutionEvent::Filled)?;
                return Ok(true);
            }
            LegWait::Unknown => return Err(unknown_state(execution.leg1())),
            LegWait::Deadline => warn!(
                execution_id = %execution.id(),
                "No cancel acknowledgement for leg 1 and the venue reports it unfilled, treating it as cancelled"
            ),
            LegWait::Closed => {}
        }

        execution.leg1_mut().mark_cancelled();
        if filled > Decimal::ZERO {
            info!(
                execution_id = %execution.id(),
                filled = %filled,
                "Leg 1 partially filled, remainder cancelled"
            );
            transition(execution, ExecutionEvent::Filled)?;
            Ok(true)
        } else {
            transition(execution, ExecutionEvent::CancelAcknowledged)?;
            Ok(false)
        }
    }

    /// Cancel `order` and wait up to `cancel_ack_timeout` for the venue to
    /// settle it. Without an ack, the venue's status decides.
    async fn cancel_and_confirm(
        &self,
        updates: &mut broadcast::Receiver<OrderUpdate>,
        order: &mut Order,
    ) -> LegWait {
        let Some(order_id) = order.id().cloned() else {
            return LegWait::Closed;
        };
        if let Err(e) = self.client.cancel(&order_id).await {
            warn!(order_id = %order_id, error = %e, "Cancel request failed");
        }

        let ack_deadline = Instant::now() + self.config.cancel_ack_timeout();
        match self.wait_for_fill(updates, order, ack_deadline).await {
            LegWait::Deadline => match self.reconcile(order).await {
                Ok(Some(outcome)) => outcome,
                Ok(None) => LegWait::Deadline,
                Err(e) => {
                    error!(order_id = %order_id, error = %e, "Order status unavailable after unacknowledged cancel");
                    LegWait::Unknown
                }
            },
            outcome => outcome,
        }
    }

    /// Apply updates for `order` until it fills, closes, or `deadline` passes.
    async fn wait_for_fill(
        &self,
        updates: &mut broadcast::Receiver<OrderUpdate>,
        order: &mut Order,
        deadline: Instant,
    ) -> LegWait {
        let Some(order_id) = order.id().cloned() else {
            return LegWait::Closed;
        };

        loop {
            tokio::select! {
                biased;
                update = updates.recv() => match update {
                    Ok(update) if update.order_id() == &order_id => match update {
                        OrderUpdate::Filled(fill) => {
                            let applied = order.apply_fill(&fill);
                            debug!(
                                order_id = %order_id,
                                applied = %applied,
                                filled = %order.filled_size(),
                                "Fill received"
                            );
                            if order.is_filled() {
                                return LegWait::Filled;
                            }
                        }
                        OrderUpdate::CancelAcknowledged { .. } => return LegWait::Closed,
                        OrderUpdate::Rejected { reason, .. } => {
                            warn!(order_id = %order_id, reason = %reason, "Order rejected by venue");
                            return LegWait::Closed;
                        }
                    },
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(order_id = %order_id, skipped, "Order update stream lagged, reconciling");
                        match self.reconcile(order).await {
                            Ok(Some(outcome)) => return outcome,
                            Ok(None) => {}
                            Err(e) => {
                                error!(order_id = %order_id, error = %e, "Order status unavailable after lost updates");
                                return LegWait::Unknown;
                            }
                        }
                    }
                    Err(RecvError::Closed) => {
                        warn!(order_id = %order_id, "Order update stream closed");
                        sleep_until(deadline).await;
                        return LegWait::Deadline;
                    }
                },
                () = sleep_until(deadline) => return LegWait::Deadline,
            }
        }
    }

    /// Bring `order` up to date with the venue's status. Returns `None` while
    /// the order is still open and not fully filled.
    async fn reconcile(&self, order: &mut Order) -> Result<Option<LegWait>, VenueError> {
        let Some(order_id) = order.id().cloned() else {
            return Ok(Some(LegWait::Closed));
        };
        let status = self.client.order_status(&order_id).await?;

        let missed = status.filled - order.filled_size();
        if missed > Decimal::ZERO {
            let venue_notional = status.average_price.unwrap_or(order.limit_price()) * status.filled;
            let price = (venue_notional - order.fill_notional()) / missed;
            order.apply_fill(&Fill::new(order_id.clone(), price, missed));
            info!(order_id = %order_id, missed = %missed, "Recovered fill from venue status");
        }

        Ok(if order.is_filled() {
            Some(LegWait::Filled)
        } else if !status.open {
            Some(LegWait::Closed)
        } else {
            None
        })
    }

    /// Report a terminal execution to the risk manager and notifiers.
    fn settle(
        &self,
        execution: &mut Execution,
        allocation: &CapitalAllocation,
        updates: broadcast::Receiver<OrderUpdate>,
    ) {
        match execution.state() {
            ExecutionState::Completed => {
                let pnl = realized_pnl(execution, &self.fees, &self.network);
                execution.set_realized_pnl(pnl);
                self.risk.release(allocation, Some(pnl));
                info!(
                    execution_id = %execution.id(),
                    opportunity_id = %execution.opportunity_id(),
                    pnl = %pnl,
                    "Execution completed"
                );
                self.notifier
                    .notify(Event::ExecutionCompleted(ExecutionReport::from(&*execution)));
            }
            ExecutionState::Cancelled => {
                execution.set_realized_pnl(Decimal::ZERO);
                self.risk.release(allocation, None);
                info!(
                    execution_id = %execution.id(),
                    opportunity_id = %execution.opportunity_id(),
                    "Execution cancelled with no exposure"
                );
                self.notifier
                    .notify(Event::ExecutionCancelled(ExecutionReport::from(&*execution)));

                if let Some(order_id) = execution.leg1().id().cloned() {
                    tokio::spawn(watch_late_fills(
                        updates,
                        order_id,
                        self.config.late_fill_watch(),
                        Arc::clone(&self.client),
                        Arc::clone(&self.notifier),
                    ));
                }
            }
            ExecutionState::Leg2TimeoutFailed => {
                execution.record_legging();
                error!(
                    execution_id = %execution.id(),
                    opportunity_id = %execution.opportunity_id(),
                    market_id = %execution.leg1().market_id(),
                    unhedged = ?execution.legging().map(|l| l.unhedged_size),
                    "Legging risk realized, manual resolution required"
                );
                self.risk.hold(allocation);
                self.notifier
                    .notify(Event::LeggingRisk(LeggingEvent::from(&*execution)));
            }
            state => {
                error!(execution_id = %execution.id(), state = %state, "Execution stopped before a terminal state");
                self.risk.release(allocation, None);
            }
        }
    }
}

fn transition(
    execution: &mut Execution,
    event: ExecutionEvent,
) -> Result<ExecutionState, DomainError> {
    let from = execution.state();
    let to = execution.apply(event)?;
    info!(
        execution_id = %execution.id(),
        from = %from,
        to = %to,
        event = ?event,
        "Execution transition"
    );
    Ok(to)
}

fn unknown_state(order: &Order) -> DomainError {
    DomainError::OrderStateUnknown {
        order_id: order.id().map(ToString::to_string).unwrap_or_default(),
    }
}

/// Report fills on a cancelled order for `window` after the ack.
async fn watch_late_fills(
    mut updates: broadcast::Receiver<OrderUpdate>,
    order_id: OrderId,
    window: Duration,
    client: Arc<dyn OrderClient>,
    notifier: Arc<dyn Notifier>,
) {
    let report = |size: Volume| {
        warn!(order_id = %order_id, size = %size, "Fill after cancel acknowledgement ignored");
        notifier.notify(Event::InconsistentFill {
            order_id: order_id.clone(),
            size,
        });
    };

    let deadline = Instant::now() + window;
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(OrderUpdate::Filled(fill)) if fill.order_id == order_id => report(fill.size),
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {
                    if let Ok(status) = client.order_status(&order_id).await {
                        if status.filled > Decimal::ZERO {
                            report(status.filled);
                            return;
                        }
                    }
                }
                Err(RecvError::Closed) => return,
            },
            () = sleep_until(deadline) => return,
        }
    }
}
