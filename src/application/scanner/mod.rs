//! Opportunity scanning.
//!
//! The scanner runs two independent detectors over one snapshot of markets:
//!
//! - [`rebalancing`]: per market, no cross-market reasoning
//! - [`combinatorial`]: per pair, in two phases
//!
//! The combinatorial phases are explicit. Phase one clusters markets by
//! topic. Phase two visits only within-cluster pairs, drops those with high
//! semantic drift, classifies the rest concurrently and runs the detector.
//!
//! Detectors perform no profitability or risk checks. Output is
//! deduplicated by opportunity id.

pub mod combinatorial;
pub mod ranking;
pub mod rebalancing;

use std::collections::{HashMap, HashSet};

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::application::classifier::{drift, RelationshipClassifier};
use crate::application::cluster::TopicClusterer;
use crate::domain::{Market, MarketId, Opportunity};

pub use combinatorial::{detect_combinatorial, CombinatorialConfig};
pub use ranking::{rank, rank_profitable, RankedOpportunity};
pub use rebalancing::{detect_rebalancing, RebalancingConfig};

/// Collaborators for combinatorial detection.
pub struct CombinatorialScan {
    pub clusterer: TopicClusterer,
    pub classifier: RelationshipClassifier,
    pub config: CombinatorialConfig,
}

/// Runs both detectors over a market snapshot.
pub struct OpportunityScanner {
    rebalancing: RebalancingConfig,
    combinatorial: Option<CombinatorialScan>,
}

impl OpportunityScanner {
    /// Scanner with rebalancing only.
    #[must_use]
    pub const fn new(rebalancing: RebalancingConfig) -> Self {
        Self {
            rebalancing,
            combinatorial: None,
        }
    }

    /// Enable combinatorial detection.
    #[must_use]
    pub fn with_combinatorial(mut self, combinatorial: CombinatorialScan) -> Self {
        self.combinatorial = Some(combinatorial);
        self
    }

    #[must_use]
    pub fn combinatorial_enabled(&self) -> bool {
        self.combinatorial
            .as_ref()
            .is_some_and(|scan| scan.config.enabled)
    }

    /// Scan one snapshot. Never fails; unusable data is skipped.
    pub async fn scan(&self, markets: &[Market]) -> Vec<Opportunity> {
        let mut found = Vec::new();

        if self.rebalancing.enabled {
            found.extend(
                markets
                    .iter()
                    .filter_map(|m| detect_rebalancing(m, &self.rebalancing)),
            );
        }
        let rebalancing_count = found.len();

        if let Some(scan) = self.combinatorial.as_ref().filter(|s| s.config.enabled) {
            found.extend(scan_pairs(scan, markets).await);
        }

        let mut seen = HashSet::new();
        found.retain(|opp| seen.insert(opp.id().clone()));

        info!(
            markets = markets.len(),
            rebalancing = rebalancing_count,
            combinatorial = found.len().saturating_sub(rebalancing_count),
            "Scan complete"
        );
        found
    }
}

async fn scan_pairs(scan: &CombinatorialScan, markets: &[Market]) -> Vec<Opportunity> {
    let clustering = match scan.clusterer.cluster(markets).await {
        Ok(clustering) => clustering,
        Err(e) => {
            warn!(error = %e, "Clustering failed, skipping combinatorial detection");
            return Vec::new();
        }
    };

    let by_id: HashMap<&MarketId, &Market> = markets.iter().map(|m| (m.id(), m)).collect();
    let index = clustering.index();

    let candidates: Vec<(&Market, &Market)> = index
        .clusters()
        .iter()
        .flat_map(|cluster| cluster.pairs())
        .filter_map(|(a, b)| Some((*by_id.get(a)?, *by_id.get(b)?)))
        .filter(|(a, b)| {
            let assessment = drift::assess(
                a,
                b,
                clustering.question_similarity(a.id(), b.id()),
                clustering.criteria_similarity(a.id(), b.id()),
            );
            let keep = assessment.risk < scan.config.max_drift;
            if !keep {
                debug!(
                    market_a = %a.id(),
                    market_b = %b.id(),
                    risk = %assessment.risk,
                    issues = ?assessment.issues,
                    "Pair dropped for semantic drift"
                );
            }
            keep
        })
        .collect();

    debug!(
        clusters = index.clusters().len(),
        pairs = index.pair_count(),
        candidates = candidates.len(),
        "Classifying within-cluster pairs"
    );

    let relationships = join_all(
        candidates
            .iter()
            .map(|(a, b)| scan.classifier.classify(a, b, index.signal(a.id(), b.id()))),
    )
    .await;

    candidates
        .iter()
        .zip(&relationships)
        .filter(|(_, rel)| scan.classifier.is_viable(rel))
        .filter_map(|((a, b), rel)| detect_combinatorial(a, b, rel, &scan.config))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::classifier::ClassifierConfig;
    use crate::application::cluster::ClusterConfig;
    use crate::domain::{StrategyKind, Venue};
    use crate::testkit::scorer::{ScriptedEmbedder, ScriptedScorer};
    use crate::port::NliLabel;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn market(id: &str, question: &str, yes: Decimal, no: Decimal) -> Market {
        Market::try_new(id, Venue::new("polymarket"), question, yes, no)
            .unwrap()
            .with_resolution_date(Utc.with_ymd_and_hms(2026, 11, 3, 0, 0, 0).unwrap())
    }

    fn scanner(embedder: ScriptedEmbedder, scorer: ScriptedScorer) -> OpportunityScanner {
        OpportunityScanner::new(RebalancingConfig::default()).with_combinatorial(CombinatorialScan {
            clusterer: TopicClusterer::new(Arc::new(embedder), ClusterConfig::default()),
            classifier: RelationshipClassifier::new(Arc::new(scorer), ClassifierConfig::default()),
            config: CombinatorialConfig::default(),
        })
    }

    fn election() -> (ScriptedEmbedder, ScriptedScorer) {
        let embedder = ScriptedEmbedder::new()
            .with("Dem wins?", vec![1.0, 0.0])
            .with("Rep wins?", vec![1.0, 0.02])
            .with("Dem wins the house?", vec![1.0, 0.01]);
        let scorer = ScriptedScorer::new()
            .with("Dem wins?", "Rep wins?", NliLabel::Contradiction, 0.9)
            .with("Rep wins?", "Dem wins?", NliLabel::Contradiction, 0.9);
        (embedder, scorer)
    }

    #[tokio::test]
    async fn finds_both_strategies() {
        let (embedder, scorer) = election();
        let markets = vec![
            market("dem", "Dem wins?", dec!(0.55), dec!(0.45)),
            market("rep", "Rep wins?", dec!(0.55), dec!(0.45)),
            market("house", "Dem wins the house?", dec!(0.46), dec!(0.46)),
        ];

        let found = scanner(embedder, scorer).scan(&markets).await;

        let strategies: Vec<_> = found.iter().map(Opportunity::strategy).collect();
        assert_eq!(found.len(), 2);
        assert!(strategies.contains(&StrategyKind::Rebalancing));
        assert!(strategies.contains(&StrategyKind::Combinatorial));
        assert!(found.iter().any(|o| o.id().as_str() == "dem+rep"));
    }

    #[tokio::test]
    async fn embedder_failure_keeps_rebalancing() {
        let markets = vec![market("m", "M?", dec!(0.46), dec!(0.46))];
        let found = scanner(ScriptedEmbedder::failing(), ScriptedScorer::new())
            .scan(&markets)
            .await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].strategy(), StrategyKind::Rebalancing);
    }

    #[tokio::test]
    async fn noise_markets_are_never_classified() {
        let embedder = ScriptedEmbedder::new()
            .with("A?", vec![1.0, 0.0])
            .with("B?", vec![0.0, 1.0]);
        let scorer = Arc::new(ScriptedScorer::new());
        let scanner = OpportunityScanner::new(RebalancingConfig::default()).with_combinatorial(
            CombinatorialScan {
                clusterer: TopicClusterer::new(Arc::new(embedder), ClusterConfig::default()),
                classifier: RelationshipClassifier::new(scorer.clone(), ClassifierConfig::default()),
                config: CombinatorialConfig::default(),
            },
        );
        let markets = vec![
            market("a", "A?", dec!(0.6), dec!(0.4)),
            market("b", "B?", dec!(0.6), dec!(0.4)),
        ];

        assert!(scanner.scan(&markets).await.is_empty());
        assert_eq!(*scorer.calls.lock(), 0);
    }

    #[tokio::test]
    async fn drifting_pairs_are_skipped() {
        let (embedder, scorer) = election();
        let later = Utc.with_ymd_and_hms(2026, 11, 5, 0, 0, 0).unwrap();
        let markets = vec![
            market("dem", "Dem wins?", dec!(0.55), dec!(0.45)).with_resolution_source("AP"),
            market("rep", "Rep wins?", dec!(0.55), dec!(0.45))
                .with_resolution_source("Fox")
                .with_resolution_date(later),
        ];
        // Text similarity is high, but date and source mismatches alone are Medium.
        let mut scanner = scanner(embedder, scorer);
        if let Some(scan) = scanner.combinatorial.as_mut() {
            scan.config.max_drift = crate::domain::DriftRisk::Medium;
        }

        assert!(scanner.scan(&markets).await.is_empty());
    }

    #[tokio::test]
    async fn rebalancing_only_scanner() {
        let scanner = OpportunityScanner::new(RebalancingConfig::default());
        assert!(!scanner.combinatorial_enabled());
        let found = scanner
            .scan(&[market("m", "M?", dec!(0.55), dec!(0.50))])
            .await;
        assert_eq!(found.len(), 1);
    }
}
