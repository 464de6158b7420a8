//! End-to-end flows: scan, rank, size, allocate and execute.

mod support;

use std::sync::Arc;
use std::time::Duration;

use arbiter::adapter::outbound::paper::{PaperConfig, PaperFeed, PaperVenue, Scenario};
use arbiter::application::classifier::{ClassifierConfig, RelationshipClassifier};
use arbiter::application::cluster::{ClusterConfig, TopicClusterer};
use arbiter::application::execution::{ExecutionConfig, ExecutionEngine};
use arbiter::application::pipeline::{Pipeline, PipelineConfig};
use arbiter::application::profitability::{
    NetworkCostConfig, ProfitabilityAnalyzer, VenueFees,
};
use arbiter::application::risk::{RiskLimits, RiskManager};
use arbiter::application::scanner::{
    CombinatorialConfig, CombinatorialScan, OpportunityScanner, RebalancingConfig,
};
use arbiter::domain::{ExecutionState, Market, StrategyKind};
use arbiter::infrastructure::bootstrap;
use arbiter::infrastructure::config::Config;
use arbiter::port::{Event, NliLabel, Notifier};
use arbiter::testkit::domain::make_liquid_market;
use arbiter::testkit::feed::StaticFeed;
use arbiter::testkit::notifier::RecordingNotifier;
use arbiter::testkit::scorer::{ScriptedEmbedder, ScriptedScorer};
use arbiter::testkit::venue::{OrderBehavior, ScriptedVenue};
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use support::scenario::{Workspace, SCENARIO};
use tokio::sync::watch;

struct PaperHarness {
    pipeline: Pipeline,
    venue: Arc<PaperVenue>,
    events: RecordingNotifier,
}

fn paper(fill_probability: f64, dry_run: bool) -> PaperHarness {
    let scenario = Arc::new(Scenario::parse(SCENARIO).unwrap());
    let paper = PaperConfig {
        fill_probability,
        latency_ms: 10,
        seed: Some(7),
        ..PaperConfig::default()
    };
    let mut config = Config::default();
    config.strategies.combinatorial.enabled = false;
    config.scanner.dry_run = dry_run;

    let venue = Arc::new(PaperVenue::new(Arc::clone(&scenario), &paper));
    let events = RecordingNotifier::new();
    let pipeline = bootstrap::assemble(
        &config,
        Arc::new(PaperFeed::new(scenario)),
        venue.clone(),
        Arc::new(events.clone()),
    );
    PaperHarness {
        pipeline,
        venue,
        events,
    }
}

#[tokio::test(start_paused = true)]
async fn paper_cycle_completes_split_trade() {
    let h = paper(1.0, false);

    let report = h.pipeline.run_cycle().await.unwrap();

    assert_eq!(report.opportunities, 1);
    assert_eq!(report.completed, 1);
    let pnl = h.pipeline.pnl();
    assert_eq!(pnl.overall.trades, 1);
    // Gross is 100 / 0.92 shares at an 0.08 spread; fees and gas come off it.
    assert!(pnl.overall.total_pnl > Decimal::ZERO);
    assert!(pnl.overall.total_pnl < dec!(8.70));
    assert_eq!(h.pipeline.exposure().total_exposure, Decimal::ZERO);
    assert_eq!(h.venue.resting_orders(), 0);
    assert_eq!(
        h.events
            .count(|e| matches!(e, Event::ExecutionCompleted(_))),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn unfilled_leg_is_cancelled_and_capital_returned() {
    let h = paper(0.0, false);

    let report = h.pipeline.run_cycle().await.unwrap();

    assert_eq!(report.cancelled, 1);
    assert_eq!(h.pipeline.pnl().overall.trades, 0);
    assert_eq!(h.pipeline.exposure().total_exposure, Decimal::ZERO);
    assert!(!h.pipeline.risk().is_circuit_breaker_active());
    assert_eq!(h.venue.resting_orders(), 0);
}

#[tokio::test(start_paused = true)]
async fn dry_run_never_reaches_the_venue() {
    let h = paper(1.0, true);

    let report = h.pipeline.run_cycle().await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.completed, 0);
    assert_eq!(h.venue.resting_orders(), 0);
    assert_eq!(
        h.events
            .count(|e| matches!(e, Event::OpportunityDetected(_))),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn run_loop_stops_on_shutdown() {
    let h = paper(1.0, false);
    let (tx, rx) = watch::channel(false);

    let (result, ()) = tokio::join!(h.pipeline.run(rx), async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let _ = tx.send(true);
    });

    result.unwrap();
    assert_eq!(h.pipeline.pnl().overall.trades, 1);
}

#[tokio::test(start_paused = true)]
async fn pipeline_from_config_file_trades_scenario() {
    let workspace = Workspace::standard();
    let config = Config::load(workspace.config_path()).unwrap();

    let pipeline = bootstrap::build_pipeline(&config).unwrap();
    let report = pipeline.run_cycle().await.unwrap();

    assert_eq!(report.completed, 1);
    assert!(pipeline.pnl().overall.total_pnl > Decimal::ZERO);
}

fn election_markets() -> Vec<Market> {
    let date = Utc.with_ymd_and_hms(2026, 11, 3, 0, 0, 0).unwrap();
    vec![
        make_liquid_market("dem", dec!(0.55), dec!(0.45), dec!(3000)).with_resolution_date(date),
        make_liquid_market("rep", dec!(0.55), dec!(0.45), dec!(2000)).with_resolution_date(date),
    ]
}

#[tokio::test(start_paused = true)]
async fn contradicting_pair_is_traded_as_combinatorial() {
    let embedder = ScriptedEmbedder::new()
        .with("dem?", vec![1.0, 0.0])
        .with("rep?", vec![1.0, 0.02]);
    let scorer = ScriptedScorer::new().with_both("dem?", "rep?", NliLabel::Contradiction, 0.95);
    let scanner = OpportunityScanner::new(RebalancingConfig::default()).with_combinatorial(
        CombinatorialScan {
            clusterer: TopicClusterer::new(Arc::new(embedder), ClusterConfig::default()),
            classifier: RelationshipClassifier::new(Arc::new(scorer), ClassifierConfig::default()),
            config: CombinatorialConfig::default(),
        },
    );

    let events = RecordingNotifier::new();
    let notifier: Arc<dyn Notifier> = Arc::new(events.clone());
    let risk = Arc::new(RiskManager::new(RiskLimits::default(), notifier.clone()));
    let venue = Arc::new(ScriptedVenue::new(vec![
        OrderBehavior::fill_after(50),
        OrderBehavior::fill_after(50),
    ]));
    let engine = Arc::new(ExecutionEngine::new(
        venue.clone(),
        risk.clone(),
        notifier.clone(),
        VenueFees::default(),
        NetworkCostConfig::default(),
        ExecutionConfig::default(),
    ));
    let pipeline = Pipeline::new(
        Arc::new(StaticFeed::new(election_markets())),
        scanner,
        ProfitabilityAnalyzer::default(),
        risk,
        engine,
        notifier,
        PipelineConfig::default(),
    );

    let ranked = pipeline.scan().await.unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].opportunity.strategy(), StrategyKind::Combinatorial);
    assert_eq!(ranked[0].opportunity.id().as_str(), "dem+rep");

    let outcome = pipeline.execute(&ranked[0]).await;

    assert_eq!(outcome.state(), Some(ExecutionState::Completed));
    let submitted = venue.submitted();
    assert_eq!(submitted.len(), 2);
    // Thinner market first.
    assert_eq!(submitted[0].market_id().as_str(), "rep");
    let pnl = pipeline.pnl();
    assert_eq!(pnl.by_strategy[&StrategyKind::Combinatorial].trades, 1);
}
