//! Per-opportunity and per-cycle results.

use serde::Serialize;

use crate::domain::{DomainError, Execution, ExecutionState};
use crate::error::RiskError;

/// What happened to one ranked opportunity.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The engine ran; the execution is terminal.
    Executed(Execution),
    /// Not sized or not allocated this cycle.
    Rejected(RiskError),
    /// Deliberately not executed.
    Skipped { reason: String },
    /// The opportunity could not be turned into orders.
    Failed(DomainError),
}

impl ExecutionOutcome {
    #[must_use]
    pub fn execution(&self) -> Option<&Execution> {
        match self {
            Self::Executed(execution) => Some(execution),
            _ => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<ExecutionState> {
        self.execution().map(Execution::state)
    }
}

/// Summary of one scan-and-execute cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub opportunities: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub legging: usize,
    pub rejected: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CycleReport {
    /// Tally outcomes of one cycle.
    #[must_use]
    pub fn from_outcomes(opportunities: usize, outcomes: &[ExecutionOutcome]) -> Self {
        let mut report = Self {
            opportunities,
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                ExecutionOutcome::Executed(execution) => match execution.state() {
                    ExecutionState::Completed => report.completed += 1,
                    ExecutionState::Leg2TimeoutFailed => report.legging += 1,
                    _ => report.cancelled += 1,
                },
                ExecutionOutcome::Rejected(_) => report.rejected += 1,
                ExecutionOutcome::Skipped { .. } => report.skipped += 1,
                ExecutionOutcome::Failed(_) => report.failed += 1,
            }
        }
        report
    }
}
