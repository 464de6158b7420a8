//! Capital reserved against an opportunity.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::id::{MarketId, OpportunityId};
use super::money::Usd;
use super::opportunity::StrategyKind;

/// Capital granted by the risk manager for one opportunity.
///
/// Exists from the moment it is granted until the execution reports a
/// terminal outcome. At most one allocation is outstanding per opportunity id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapitalAllocation {
    opportunity_id: OpportunityId,
    strategy: StrategyKind,
    amount: Usd,
    markets: Vec<MarketId>,
    granted_at: DateTime<Utc>,
}

impl CapitalAllocation {
    #[must_use]
    pub fn new(
        opportunity_id: OpportunityId,
        strategy: StrategyKind,
        amount: Usd,
        markets: Vec<MarketId>,
    ) -> Self {
        Self {
            opportunity_id,
            strategy,
            amount,
            markets,
            granted_at: Utc::now(),
        }
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
    pub const fn amount(&self) -> Usd {
        self.amount
    }

    /// Distinct markets the capital is exposed to.
    #[must_use]
    pub fn markets(&self) -> &[MarketId] {
        &self.markets
    }

    /// Exposure attributed to each market: the amount split evenly.
    #[must_use]
    pub fn per_market_amount(&self) -> Usd {
        if self.markets.is_empty() {
            self.amount
        } else {
            self.amount / rust_decimal::Decimal::from(self.markets.len())
        }
    }

    #[must_use]
    pub const fn granted_at(&self) -> DateTime<Utc> {
        self.granted_at
    }
}
