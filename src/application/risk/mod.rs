//! Risk management: position sizing, the shared capital ledger, and
//! circuit breaker control.
//!
//! - [`ledger`]: Serializable reserve/release bookkeeping
//! - [`manager`]: The service every caller goes through

pub mod ledger;
pub mod manager;

use crate::domain::CapitalAllocation;
use crate::error::RiskError;

pub use ledger::{CapitalLedger, RiskLimits};
pub use manager::RiskManager;

/// Result of an allocation request.
///
/// A rejection is a normal negative result, not a failure.
#[derive(Debug, Clone)]
pub enum RiskCheckResult {
    /// Capital is reserved under this allocation.
    Approved(CapitalAllocation),

    /// A cap or the circuit breaker blocked the request.
    Rejected(RiskError),
}

impl RiskCheckResult {
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved(_))
    }

    #[must_use]
    pub const fn allocation(&self) -> Option<&CapitalAllocation> {
        match self {
            Self::Approved(allocation) => Some(allocation),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub const fn rejection_error(&self) -> Option<&RiskError> {
        match self {
            Self::Rejected(e) => Some(e),
            Self::Approved(_) => None,
        }
    }
}
