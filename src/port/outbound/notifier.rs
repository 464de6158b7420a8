//! Notifier port for event notifications.
//!
//! This module defines the trait for sending notifications about
//! system events such as detected opportunities, execution outcomes, and
//! realized legging risk.

use rust_decimal::Decimal;

use crate::domain::{Execution, LeggingExposure, Opportunity, OrderId};
use crate::error::RiskError;

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// Opportunity passed profitability and is about to be allocated.
    OpportunityDetected(OpportunityEvent),
    /// Both legs filled.
    ExecutionCompleted(ExecutionReport),
    /// Leg 1 never filled; no exposure.
    ExecutionCancelled(ExecutionReport),
    /// Leg 2 failed after leg 1 filled. Requires external intervention.
    LeggingRisk(LeggingEvent),
    /// A fill arrived for an order whose cancel was already acknowledged.
    InconsistentFill {
        /// Order that filled late.
        order_id: OrderId,
        /// Quantity reported filled.
        size: Decimal,
    },
    /// Risk manager declined to allocate capital.
    AllocationRejected(RiskEvent),
    /// Circuit breaker activated.
    CircuitBreakerActivated {
        /// The reason for activation.
        reason: String,
    },
    /// Circuit breaker reset.
    CircuitBreakerReset,
}

/// Opportunity detection event.
#[derive(Debug, Clone)]
pub struct OpportunityEvent {
    pub opportunity_id: String,
    pub strategy: String,
    pub summary: String,
    pub raw_spread: Decimal,
    pub expected_profit: Decimal,
}

impl OpportunityEvent {
    #[must_use]
    pub fn new(opportunity: &Opportunity, expected_profit: Decimal) -> Self {
        Self {
            opportunity_id: opportunity.id().to_string(),
            strategy: opportunity.strategy().to_string(),
            summary: opportunity.summary().to_string(),
            raw_spread: opportunity.raw_spread(),
            expected_profit,
        }
    }
}

/// Terminal execution event.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub execution_id: String,
    pub opportunity_id: String,
    pub state: String,
    pub realized_pnl: Option<Decimal>,
}

impl From<&Execution> for ExecutionReport {
    fn from(execution: &Execution) -> Self {
        Self {
            execution_id: execution.id().to_string(),
            opportunity_id: execution.opportunity_id().to_string(),
            state: execution.state().to_string(),
            realized_pnl: execution.realized_pnl(),
        }
    }
}

/// Realized legging risk.
#[derive(Debug, Clone)]
pub struct LeggingEvent {
    pub execution_id: String,
    pub opportunity_id: String,
    pub exposure: Option<LeggingExposure>,
}

impl From<&Execution> for LeggingEvent {
    fn from(execution: &Execution) -> Self {
        Self {
            execution_id: execution.id().to_string(),
            opportunity_id: execution.opportunity_id().to_string(),
            exposure: execution.legging().cloned(),
        }
    }
}

/// Allocation rejection event.
#[derive(Debug, Clone)]
pub struct RiskEvent {
    pub opportunity_id: String,
    pub reason: String,
}

impl RiskEvent {
    #[must_use]
    pub fn new(opportunity_id: &str, error: &RiskError) -> Self {
        Self {
            opportunity_id: opportunity_id.to_string(),
            reason: error.to_string(),
        }
    }
}

/// Trait for notification handlers.
///
/// Notifications are fire-and-forget. Implementations must return quickly
/// and spawn tasks for slow I/O.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for NotifierRegistry {
    fn notify(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    struct Recording(Arc<Mutex<Vec<String>>>);

    impl Notifier for Recording {
        fn notify(&self, event: Event) {
            self.0.lock().push(format!("{event:?}"));
        }
    }

    #[test]
    fn registry_broadcasts_to_every_notifier() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(Recording(seen.clone())));
        registry.register(Box::new(Recording(seen.clone())));

        registry.notify(Event::CircuitBreakerReset);

        assert_eq!(registry.len(), 2);
        assert_eq!(seen.lock().len(), 2);
    }
}
