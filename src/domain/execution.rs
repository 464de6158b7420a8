//! Two-leg execution state machine.
//!
//! The transition table is a pure function ([`ExecutionState::next`]) so it
//! can be exercised exhaustively without a venue. The engine drives it.
//!
//! ```text
//! Pending ──submit──▶ Leg1Submitted ──fill──▶ Leg1Filled ──submit──▶ Leg2Submitted ──fill──▶ Completed
//!    │                    │                      │                       │
//!    │ submit failed      │ deadline             │ submit failed         │ deadline
//!    ▼                    ▼                      ▼                       ▼
//! Cancelled ◀──ack── Leg1TimeoutCancelled    Leg2TimeoutFailed ◀─────────┘
//!                         │ fill before ack
//!                         └──────────▶ Leg1Filled
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{ExecutionId, MarketId, OpportunityId};
use super::market::Outcome;
use super::money::{Price, Usd, Volume};
use super::opportunity::StrategyKind;
use super::order::{Order, OrderSide};

/// Execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Pending,
    Leg1Submitted,
    Leg1Filled,
    Leg1TimeoutCancelled,
    Leg2Submitted,
    Leg2TimeoutFailed,
    Completed,
    Cancelled,
}

impl ExecutionState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Leg2TimeoutFailed
        )
    }

    /// Apply an event, returning the next state.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTransition`] when the event does not
    /// apply, including any event after a terminal state.
    pub fn next(self, event: ExecutionEvent) -> Result<Self, DomainError> {
        use ExecutionEvent as E;
        use ExecutionState as S;

        let next = match (self, event) {
            (S::Pending, E::Submitted) => S::Leg1Submitted,
            (S::Pending, E::SubmitFailed) => S::Cancelled,

            (S::Leg1Submitted, E::Filled) => S::Leg1Filled,
            (S::Leg1Submitted, E::DeadlineElapsed) => S::Leg1TimeoutCancelled,

            // A fill observed before the cancel ack wins the race.
            (S::Leg1TimeoutCancelled, E::Filled) => S::Leg1Filled,
            (S::Leg1TimeoutCancelled, E::CancelAcknowledged) => S::Cancelled,

            (S::Leg1Filled, E::Submitted) => S::Leg2Submitted,
            (S::Leg1Filled, E::SubmitFailed) => S::Leg2TimeoutFailed,

            (S::Leg2Submitted, E::Filled) => S::Completed,
            (S::Leg2Submitted, E::DeadlineElapsed) => S::Leg2TimeoutFailed,

            (from, event) => return Err(DomainError::InvalidTransition { from, event }),
        };
        Ok(next)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Leg1Submitted => "LEG1_SUBMITTED",
            Self::Leg1Filled => "LEG1_FILLED",
            Self::Leg1TimeoutCancelled => "LEG1_TIMEOUT_CANCELLED",
            Self::Leg2Submitted => "LEG2_SUBMITTED",
            Self::Leg2TimeoutFailed => "LEG2_TIMEOUT_FAILED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Inputs to the state machine. The current state determines which leg an
/// event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionEvent {
    Submitted,
    SubmitFailed,
    Filled,
    DeadlineElapsed,
    CancelAcknowledged,
}

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    pub from: ExecutionState,
    pub to: ExecutionState,
    pub event: ExecutionEvent,
    pub at: DateTime<Utc>,
}

/// One-sided exposure left behind when leg 2 fails after leg 1 filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeggingExposure {
    pub market_id: MarketId,
    pub outcome: Outcome,
    pub side: OrderSide,
    /// Leg 1 quantity with no matching leg 2 fill.
    pub unhedged_size: Volume,
    pub average_price: Price,
}

/// One atomic two-leg trade.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    id: ExecutionId,
    opportunity_id: OpportunityId,
    strategy: StrategyKind,
    leg1: Order,
    leg2: Order,
    state: ExecutionState,
    history: Vec<Transition>,
    realized_pnl: Option<Usd>,
    legging: Option<LeggingExposure>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl Execution {
    /// Create a pending execution. `leg1` must be the less liquid leg.
    #[must_use]
    pub fn new(
        opportunity_id: OpportunityId,
        strategy: StrategyKind,
        leg1: Order,
        leg2: Order,
    ) -> Self {
        Self {
            id: ExecutionId::new(),
            opportunity_id,
            strategy,
            leg1,
            leg2,
            state: ExecutionState::Pending,
            history: Vec::new(),
            realized_pnl: None,
            legging: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Advance the state machine and record the transition.
    ///
    /// # Errors
    ///
    /// Propagates [`DomainError::InvalidTransition`]; state is unchanged on error.
    pub fn apply(&mut self, event: ExecutionEvent) -> Result<ExecutionState, DomainError> {
        let from = self.state;
        let to = from.next(event)?;
        self.state = to;
        self.history.push(Transition {
            from,
            to,
            event,
            at: Utc::now(),
        });
        if to.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(to)
    }

    #[must_use]
    pub const fn id(&self) -> &ExecutionId {
        &self.id
    }

    #[must_use]
    pub const fn opportunity_id(&self) -> &OpportunityId {
        &self.opportunity_id
    }

    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    #[must_use]
    pub const fn state(&self) -> ExecutionState {
        self.state
    }

    #[must_use]
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    #[must_use]
    pub const fn leg1(&self) -> &Order {
        &self.leg1
    }

    #[must_use]
    pub const fn leg2(&self) -> &Order {
        &self.leg2
    }

    pub fn leg1_mut(&mut self) -> &mut Order {
        &mut self.leg1
    }

    pub fn leg2_mut(&mut self) -> &mut Order {
        &mut self.leg2
    }

    #[must_use]
    pub const fn realized_pnl(&self) -> Option<Usd> {
        self.realized_pnl
    }

    pub fn set_realized_pnl(&mut self, pnl: Usd) {
        self.realized_pnl = Some(pnl);
    }

    #[must_use]
    pub const fn legging(&self) -> Option<&LeggingExposure> {
        self.legging.as_ref()
    }

    /// True when the execution ended with one-sided exposure.
    #[must_use]
    pub fn has_legging_risk(&self) -> bool {
        self.state == ExecutionState::Leg2TimeoutFailed
    }

    /// Record the exposure left by leg 1 against whatever leg 2 filled.
    pub fn record_legging(&mut self) {
        let unhedged = self.leg1.filled_size() - self.leg2.filled_size();
        self.legging = Some(LeggingExposure {
            market_id: self.leg1.market_id().clone(),
            outcome: self.leg1.outcome(),
            side: self.leg1.side(),
            unhedged_size: unhedged.max(Decimal::ZERO),
            average_price: self.leg1.average_fill_price().unwrap_or(self.leg1.limit_price()),
        });
    }

    /// True if any transition passed through `state`.
    #[must_use]
    pub fn visited(&self, state: ExecutionState) -> bool {
        self.state == state || self.history.iter().any(|t| t.from == state || t.to == state)
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::Venue;
    use rust_decimal_macros::dec;

    use ExecutionEvent as E;
    use ExecutionState as S;

    const EVENTS: [ExecutionEvent; 5] = [
        E::Submitted,
        E::SubmitFailed,
        E::Filled,
        E::DeadlineElapsed,
        E::CancelAcknowledged,
    ];

    fn order(market: &str) -> Order {
        Order::try_new(
            MarketId::new(market),
            Venue::new("polymarket"),
            Outcome::Yes,
            OrderSide::Buy,
            dec!(0.45),
            dec!(10),
        )
        .unwrap()
    }

    fn execution() -> Execution {
        Execution::new(
            OpportunityId::from("opp"),
            StrategyKind::Combinatorial,
            order("thin"),
            order("deep"),
        )
    }

    #[test]
    fn happy_path_completes() {
        let mut exec = execution();
        for event in [E::Submitted, E::Filled, E::Submitted, E::Filled] {
            exec.apply(event).unwrap();
        }
        assert_eq!(exec.state(), S::Completed);
        assert_eq!(exec.history().len(), 4);
        assert!(exec.finished_at().is_some());
    }

    #[test]
    fn leg1_timeout_then_ack_cancels() {
        let mut exec = execution();
        for event in [E::Submitted, E::DeadlineElapsed, E::CancelAcknowledged] {
            exec.apply(event).unwrap();
        }
        assert_eq!(exec.state(), S::Cancelled);
        assert!(exec.visited(S::Leg1TimeoutCancelled));
    }

    #[test]
    fn fill_before_cancel_ack_proceeds() {
        let s = S::Leg1TimeoutCancelled.next(E::Filled).unwrap();
        assert_eq!(s, S::Leg1Filled);
    }

    #[test]
    fn leg2_submit_failure_is_legging_risk() {
        assert_eq!(S::Leg1Filled.next(E::SubmitFailed).unwrap(), S::Leg2TimeoutFailed);
    }

    #[test]
    fn leg1_submit_failure_cancels() {
        assert_eq!(S::Pending.next(E::SubmitFailed).unwrap(), S::Cancelled);
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for state in [S::Completed, S::Cancelled, S::Leg2TimeoutFailed] {
            for event in EVENTS {
                assert!(state.next(event).is_err(), "{state} accepted {event:?}");
            }
        }
    }

    #[test]
    fn rejected_event_leaves_state_unchanged() {
        let mut exec = execution();
        assert!(exec.apply(E::Filled).is_err());
        assert_eq!(exec.state(), S::Pending);
        assert!(exec.history().is_empty());
    }

    /// Drive the machine the way the engine does: submit whenever a leg is
    /// ready, feed observed venue events from `script`, and fall back to a
    /// deadline (then cancel ack) when the script runs dry.
    fn drive(script: &[ExecutionEvent]) -> Execution {
        let mut exec = execution();
        let mut script = script.iter().copied();
        while !exec.state().is_terminal() {
            let event = match exec.state() {
                S::Pending | S::Leg1Filled => E::Submitted,
                S::Leg1Submitted | S::Leg2Submitted => {
                    script.next().unwrap_or(E::DeadlineElapsed)
                }
                S::Leg1TimeoutCancelled => script.next().unwrap_or(E::CancelAcknowledged),
                _ => unreachable!(),
            };
            // Venue events that do not apply in the current state are ignored.
            let _ = exec.apply(event);
        }
        exec
    }

    #[test]
    fn every_event_sequence_reaches_exactly_one_terminal_state() {
        let venue_events = [E::Filled, E::DeadlineElapsed, E::CancelAcknowledged];
        let mut sequences: Vec<Vec<ExecutionEvent>> = vec![vec![]];
        for _ in 0..5 {
            let mut longer = Vec::new();
            for seq in &sequences {
                for e in venue_events {
                    let mut s = seq.clone();
                    s.push(e);
                    longer.push(s);
                }
            }
            sequences.extend(longer);
        }

        for seq in &sequences {
            let exec = drive(seq);
            let terminal = exec.state();
            assert!(
                matches!(terminal, S::Cancelled | S::Completed | S::Leg2TimeoutFailed),
                "{seq:?} ended in {terminal}"
            );
            let terminal_transitions = exec.history().iter().filter(|t| t.to.is_terminal()).count();
            assert_eq!(terminal_transitions, 1, "{seq:?}");
            if terminal == S::Cancelled {
                assert!(!exec.visited(S::Leg2Submitted), "{seq:?} exposed leg 2");
            }
        }
    }

    #[test]
    fn legging_records_unhedged_quantity() {
        let mut exec = execution();
        exec.leg1_mut()
            .apply_fill(&crate::domain::order::Fill::new("o1".into(), dec!(0.45), dec!(10)));
        exec.leg2_mut()
            .apply_fill(&crate::domain::order::Fill::new("o2".into(), dec!(0.45), dec!(4)));
        exec.record_legging();

        let legging = exec.legging().unwrap();
        assert_eq!(legging.unhedged_size, dec!(6));
        assert_eq!(legging.market_id, MarketId::new("thin"));
    }
}
