//! Notification adapters.
//!
//! Implements the `port::Notifier` trait. Alert delivery to chat services is
//! left to external collaborators; these adapters cover logging and tests.

use tracing::{error, info, warn};

use crate::port::{Event, Notifier};

/// A no-op notifier for testing or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        match event {
            Event::OpportunityDetected(e) => {
                info!(
                    opportunity_id = %e.opportunity_id,
                    strategy = %e.strategy,
                    spread = %e.raw_spread,
                    profit = %e.expected_profit,
                    "Opportunity detected"
                );
            }
            Event::ExecutionCompleted(e) => {
                info!(
                    execution_id = %e.execution_id,
                    opportunity_id = %e.opportunity_id,
                    pnl = ?e.realized_pnl,
                    "Execution completed"
                );
            }
            Event::ExecutionCancelled(e) => {
                info!(
                    execution_id = %e.execution_id,
                    opportunity_id = %e.opportunity_id,
                    "Execution cancelled"
                );
            }
            Event::LeggingRisk(e) => {
                error!(
                    execution_id = %e.execution_id,
                    opportunity_id = %e.opportunity_id,
                    market_id = ?e.exposure.as_ref().map(|x| x.market_id.to_string()),
                    unhedged = ?e.exposure.as_ref().map(|x| x.unhedged_size),
                    "Legging risk realized"
                );
            }
            Event::InconsistentFill { order_id, size } => {
                error!(order_id = %order_id, size = %size, "Fill after cancel acknowledgement");
            }
            Event::AllocationRejected(e) => {
                info!(
                    opportunity_id = %e.opportunity_id,
                    reason = %e.reason,
                    "Allocation rejected"
                );
            }
            Event::CircuitBreakerActivated { reason } => {
                warn!(reason = %reason, "Circuit breaker activated");
            }
            Event::CircuitBreakerReset => {
                info!("Circuit breaker reset");
            }
        }
    }
}
