//! The opportunity pipeline.
//!
//! ```text
//! feed ─▶ scanner ─▶ profitability ─▶ rank ─▶ risk ─▶ engine ─▶ risk
//! ```
//!
//! One [`Pipeline`] owns the collaborators for a deployment and exposes the
//! three entry points callers need: [`scan`](Pipeline::scan),
//! [`execute`](Pipeline::execute) and the read-only exposure and P&L queries.
//! [`run`](Pipeline::run) repeats scan-and-execute on a fixed cadence.

pub mod outcome;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::application::execution::ExecutionEngine;
use crate::application::profitability::ProfitabilityAnalyzer;
use crate::application::risk::{RiskCheckResult, RiskManager};
use crate::application::scanner::{rank_profitable, OpportunityScanner, RankedOpportunity};
use crate::domain::{Books, ExposureMetrics, MarketId, Opportunity, Outcome, PnlSummary, Usd};
use crate::error::{ConfigError, Result};
use crate::port::{Event, MarketFeed, Notifier, OpportunityEvent, RiskEvent};

pub use outcome::{CycleReport, ExecutionOutcome};

/// Scan cadence and sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Seconds between scan cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Ranked opportunities kept per cycle.
    #[serde(default = "default_max_opportunities")]
    pub max_opportunities: usize,
    /// Position size used for the first-pass profitability estimate.
    #[serde(default = "default_nominal_size")]
    pub nominal_size: Usd,
    /// Log what would execute instead of trading.
    #[serde(default)]
    pub dry_run: bool,
}

const fn default_interval_secs() -> u64 {
    30
}

const fn default_max_opportunities() -> usize {
    10
}

fn default_nominal_size() -> Usd {
    dec!(100)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_opportunities: default_max_opportunities(),
            nominal_size: default_nominal_size(),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.interval_secs",
                reason: "must be greater than 0".into(),
            });
        }
        if self.max_opportunities == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scanner.max_opportunities",
                reason: "must be greater than 0".into(),
            });
        }
        if self.nominal_size <= Decimal::ZERO {
            return Err(ConfigError::InvalidValue {
                field: "scanner.nominal_size",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Scan, gate, allocate and execute.
pub struct Pipeline {
    feed: Arc<dyn MarketFeed>,
    scanner: OpportunityScanner,
    analyzer: ProfitabilityAnalyzer,
    risk: Arc<RiskManager>,
    engine: Arc<ExecutionEngine>,
    notifier: Arc<dyn Notifier>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        scanner: OpportunityScanner,
        analyzer: ProfitabilityAnalyzer,
        risk: Arc<RiskManager>,
        engine: Arc<ExecutionEngine>,
        notifier: Arc<dyn Notifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            feed,
            scanner,
            analyzer,
            risk,
            engine,
            notifier,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn risk(&self) -> &RiskManager {
        &self.risk
    }

    /// Scan one market snapshot and return profitable opportunities, ranked
    /// by estimated net profit and capped at `max_opportunities`.
    pub async fn scan(&self) -> Result<Vec<RankedOpportunity>> {
        let markets = self.feed.markets().await?;
        let candidates = self.scanner.scan(&markets).await;
        let books = self.load_books(&candidates).await;

        let candidate_count = candidates.len();
        let ranked = rank_profitable(
            &self.analyzer,
            candidates,
            &books,
            self.config.nominal_size,
            self.config.max_opportunities,
        );
        info!(
            markets = markets.len(),
            candidates = candidate_count,
            ranked = ranked.len(),
            "Opportunities ranked"
        );
        Ok(ranked)
    }

    /// Size, allocate and execute one ranked opportunity.
    pub async fn execute(&self, ranked: &RankedOpportunity) -> ExecutionOutcome {
        let opportunity = &ranked.opportunity;
        self.notifier.notify(Event::OpportunityDetected(OpportunityEvent::new(
            opportunity,
            ranked.analysis.net_profit,
        )));

        if self.config.dry_run {
            info!(
                opportunity_id = %opportunity.id(),
                profit = %ranked.analysis.net_profit,
                "Dry-run: would execute trade"
            );
            return ExecutionOutcome::Skipped {
                reason: "dry run".into(),
            };
        }

        let size = self.risk.calculate_position_size(
            opportunity,
            opportunity.min_liquidity(),
            Some(ranked.analysis.position_size),
        );

        // A zero size is rejected by the ledger with the binding reason.
        match self.risk.allocate_capital(
            opportunity.id(),
            opportunity.strategy(),
            &opportunity.markets(),
            size,
        ) {
            RiskCheckResult::Approved(allocation) => {
                match self.engine.execute(opportunity, allocation).await {
                    Ok(execution) => ExecutionOutcome::Executed(execution),
                    Err(e) => ExecutionOutcome::Failed(e),
                }
            }
            RiskCheckResult::Rejected(e) => {
                self.notifier.notify(Event::AllocationRejected(RiskEvent::new(
                    opportunity.id().as_str(),
                    &e,
                )));
                ExecutionOutcome::Rejected(e)
            }
        }
    }

    /// One scan followed by concurrent execution of every ranked opportunity.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let ranked = self.scan().await?;
        let outcomes = join_all(ranked.iter().map(|r| self.execute(r))).await;
        let report = CycleReport::from_outcomes(ranked.len(), &outcomes);
        info!(
            opportunities = report.opportunities,
            completed = report.completed,
            cancelled = report.cancelled,
            legging = report.legging,
            rejected = report.rejected,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Run cycles every `interval_secs` until `shutdown` turns true.
    ///
    /// A failed cycle is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval_secs,
            dry_run = self.config.dry_run,
            "Pipeline running"
        );

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Shutdown signal received");
                        break;
                    }
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        warn!(error = %e, "Cycle failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// Read-only exposure snapshot.
    #[must_use]
    pub fn exposure(&self) -> ExposureMetrics {
        self.risk.get_exposure_metrics()
    }

    #[must_use]
    pub fn pnl(&self) -> PnlSummary {
        self.risk.pnl_summary()
    }

    /// Fetch every book the candidates' legs need. Missing books are left
    /// out; the analyzer prices them conservatively.
    async fn load_books(&self, candidates: &[Opportunity]) -> Books {
        let wanted: HashSet<(MarketId, Outcome)> = candidates
            .iter()
            .flat_map(|opp| opp.legs().iter())
            .map(|leg| (leg.market_id.clone(), leg.outcome))
            .collect();

        let fetched = join_all(wanted.iter().map(|(market_id, outcome)| async move {
            match self.feed.orderbook(market_id, *outcome).await {
                Ok(book) => book,
                Err(e) => {
                    debug!(market_id = %market_id, outcome = %outcome, error = %e, "Orderbook unavailable");
                    None
                }
            }
        }))
        .await;

        let mut books = Books::new();
        for book in fetched.into_iter().flatten() {
            books.insert(book);
        }
        books
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::execution::ExecutionConfig;
    use crate::application::profitability::{NetworkCostConfig, VenueFees};
    use crate::application::risk::RiskLimits;
    use crate::application::scanner::RebalancingConfig;
    use crate::domain::Market;
    use crate::testkit::domain::make_liquid_market;
    use crate::testkit::feed::StaticFeed;
    use crate::testkit::notifier::RecordingNotifier;
    use crate::testkit::venue::{OrderBehavior, ScriptedVenue};

    fn pipeline(
        markets: Vec<Market>,
        venue: ScriptedVenue,
        config: PipelineConfig,
    ) -> (Pipeline, Arc<StaticFeed>, RecordingNotifier) {
        let feed = Arc::new(StaticFeed::new(markets));
        let events = RecordingNotifier::new();
        let notifier: Arc<dyn Notifier> = Arc::new(events.clone());
        let risk = Arc::new(RiskManager::new(RiskLimits::default(), notifier.clone()));
        let engine = Arc::new(ExecutionEngine::new(
            Arc::new(venue),
            risk.clone(),
            notifier.clone(),
            VenueFees::default(),
            NetworkCostConfig::default(),
            ExecutionConfig::default(),
        ));
        let pipeline = Pipeline::new(
            feed.clone(),
            OpportunityScanner::new(RebalancingConfig::default()),
            ProfitabilityAnalyzer::default(),
            risk,
            engine,
            notifier,
            config,
        );
        (pipeline, feed, events)
    }

    fn markets() -> Vec<Market> {
        vec![
            make_liquid_market("wide", dec!(0.40), dec!(0.45), dec!(1000)),
            make_liquid_market("narrow", dec!(0.46), dec!(0.46), dec!(1000)),
            make_liquid_market("fair", dec!(0.50), dec!(0.50), dec!(1000)),
            make_liquid_market("noise", dec!(0.49), dec!(0.50), dec!(1000)),
        ]
    }

    #[tokio::test]
    async fn scan_ranks_profitable_only() {
        let (pipeline, _, _) = pipeline(markets(), ScriptedVenue::new(vec![]), PipelineConfig::default());

        let ranked = pipeline.scan().await.unwrap();

        let ids: Vec<_> = ranked.iter().map(|r| r.opportunity.id().as_str()).collect();
        assert_eq!(ids, vec!["wide", "narrow"]);
        assert!(ranked[0].analysis.net_profit > ranked[1].analysis.net_profit);
    }

    #[tokio::test]
    async fn scan_respects_cap() {
        let config = PipelineConfig {
            max_opportunities: 1,
            ..PipelineConfig::default()
        };
        let (pipeline, _, _) = pipeline(markets(), ScriptedVenue::new(vec![]), config);
        assert_eq!(pipeline.scan().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn feed_failure_is_an_error() {
        let (pipeline, feed, _) = pipeline(markets(), ScriptedVenue::new(vec![]), PipelineConfig::default());
        feed.set_failing(true);
        assert!(pipeline.scan().await.is_err());
    }

    #[tokio::test]
    async fn dry_run_skips_without_allocating() {
        let config = PipelineConfig {
            dry_run: true,
            ..PipelineConfig::default()
        };
        let (pipeline, _, events) = pipeline(markets(), ScriptedVenue::new(vec![]), config);

        let report = pipeline.run_cycle().await.unwrap();

        assert_eq!(report.skipped, 2);
        assert_eq!(pipeline.exposure().total_exposure, Decimal::ZERO);
        assert_eq!(
            events.count(|e| matches!(e, Event::OpportunityDetected(_))),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cycle_executes_and_settles() {
        let market = make_liquid_market("m", dec!(0.46), dec!(0.46), dec!(1000));
        let venue = ScriptedVenue::new(vec![
            OrderBehavior::fill_at(10, dec!(0.46)),
            OrderBehavior::fill_at(10, dec!(0.46)),
        ]);
        let (pipeline, _, _) = pipeline(vec![market], venue, PipelineConfig::default());

        let report = pipeline.run_cycle().await.unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(pipeline.pnl().overall.trades, 1);
        assert!(pipeline.pnl().overall.total_pnl > Decimal::ZERO);
        assert_eq!(pipeline.exposure().total_exposure, Decimal::ZERO);
    }

    #[tokio::test]
    async fn breaker_rejects_and_notifies() {
        let (pipeline, _, events) =
            pipeline(markets(), ScriptedVenue::new(vec![]), PipelineConfig::default());
        pipeline.risk().trigger_circuit_breaker("manual");

        let ranked = pipeline.scan().await.unwrap();
        let outcome = pipeline.execute(&ranked[0]).await;

        assert!(matches!(outcome, ExecutionOutcome::Rejected(_)));
        assert!(outcome.state().is_none());
        assert_eq!(
            events.count(|e| matches!(e, Event::AllocationRejected(_))),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_shutdown() {
        let (pipeline, _, _) =
            pipeline(Vec::new(), ScriptedVenue::new(vec![]), PipelineConfig::default());
        let (tx, rx) = watch::channel(false);

        let handle = async {
            tokio::time::sleep(Duration::from_secs(65)).await;
            tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(pipeline.run(rx), handle);

        assert!(result.is_ok());
    }
}
