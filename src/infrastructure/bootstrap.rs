//! Composition root: wires adapters and services from [`Config`].

use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::outbound::inference::LlmScorer;
use crate::adapter::outbound::llm::OpenAi;
use crate::adapter::outbound::notifier::{LogNotifier, NullNotifier};
use crate::adapter::outbound::paper::{load_history, PaperFeed, PaperVenue, Scenario};
use crate::application::backtest::Backtester;
use crate::application::classifier::RelationshipClassifier;
use crate::application::cluster::TopicClusterer;
use crate::application::execution::ExecutionEngine;
use crate::application::pipeline::Pipeline;
use crate::application::profitability::ProfitabilityAnalyzer;
use crate::application::risk::RiskManager;
use crate::application::scanner::{CombinatorialScan, OpportunityScanner};
use crate::domain::MarketSnapshot;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{Embedder, MarketFeed, Notifier, NotifierRegistry, OrderClient};

/// Build the notifier registry. Every event is logged.
pub fn build_notifier_registry() -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    registry.register(Box::new(LogNotifier));
    registry
}

/// Build the opportunity scanner.
///
/// Combinatorial detection needs the LLM backend. When it is enabled but
/// `OPENAI_API_KEY` is missing, the scanner falls back to rebalancing only.
pub fn build_scanner(config: &Config) -> OpportunityScanner {
    let scanner = OpportunityScanner::new(config.strategies.rebalancing.clone());
    if !config.strategies.combinatorial.enabled {
        return scanner;
    }

    match OpenAi::from_env(&config.llm) {
        Ok(client) => {
            let client = Arc::new(client);
            info!(model = %client.model(), "Combinatorial detection enabled");
            let embedder: Arc<dyn Embedder> = client.clone();
            scanner.with_combinatorial(CombinatorialScan {
                clusterer: TopicClusterer::new(embedder, config.clustering.clone()),
                classifier: RelationshipClassifier::new(
                    Arc::new(LlmScorer::new(client)),
                    config.classifier.clone(),
                ),
                config: config.strategies.combinatorial.clone(),
            })
        }
        Err(e) => {
            warn!(error = %e, "Combinatorial detection disabled");
            scanner
        }
    }
}

/// Build the full pipeline over the paper venue.
///
/// # Errors
///
/// Returns an error if the scenario file cannot be loaded.
pub fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let scenario = Arc::new(Scenario::load(&config.paper.scenario)?);
    info!(
        scenario = %config.paper.scenario.display(),
        markets = scenario.markets().len(),
        "Scenario loaded"
    );

    let feed: Arc<dyn MarketFeed> = Arc::new(PaperFeed::new(Arc::clone(&scenario)));
    let client: Arc<dyn OrderClient> = Arc::new(PaperVenue::new(scenario, &config.paper));
    let notifier: Arc<dyn Notifier> = Arc::new(build_notifier_registry());

    Ok(assemble(config, feed, client, notifier))
}

/// Build a backtester and load the configured history.
///
/// Replays never notify; a replayed breaker trip is not a live event.
///
/// # Errors
///
/// Returns an error if the history file cannot be loaded.
pub fn build_backtest(config: &Config) -> Result<(Backtester, Vec<MarketSnapshot>)> {
    let snapshots = load_history(&config.backtest.history)?;
    info!(
        history = %config.backtest.history.display(),
        snapshots = snapshots.len(),
        "History loaded"
    );

    let risk = Arc::new(RiskManager::new(
        config.risk.clone().into(),
        Arc::new(NullNotifier),
    ));
    let backtester = Backtester::new(
        build_scanner(config),
        build_analyzer(config),
        risk,
        config.scanner.clone(),
        config.backtest.clone(),
    );
    Ok((backtester, snapshots))
}

fn build_analyzer(config: &Config) -> ProfitabilityAnalyzer {
    ProfitabilityAnalyzer::new(
        config.venues.clone(),
        config.network.clone(),
        config.profitability.clone(),
    )
}

/// Assemble a pipeline around the given collaborators.
pub fn assemble(
    config: &Config,
    feed: Arc<dyn MarketFeed>,
    client: Arc<dyn OrderClient>,
    notifier: Arc<dyn Notifier>,
) -> Pipeline {
    let risk = Arc::new(RiskManager::new(
        config.risk.clone().into(),
        Arc::clone(&notifier),
    ));
    let analyzer = build_analyzer(config);
    let engine = Arc::new(ExecutionEngine::new(
        client,
        Arc::clone(&risk),
        Arc::clone(&notifier),
        config.venues.clone(),
        config.network.clone(),
        config.execution.clone(),
    ));

    Pipeline::new(
        feed,
        build_scanner(config),
        analyzer,
        risk,
        engine,
        notifier,
        config.scanner.clone(),
    )
}
