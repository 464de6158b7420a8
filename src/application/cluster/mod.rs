//! Topic clustering of markets.
//!
//! Questions are embedded through the [`Embedder`] port and grouped with
//! DBSCAN over cosine distance. Only markets sharing a cluster are ever
//! compared pairwise, which bounds combinatorial detection to within-cluster
//! pairs instead of all pairs.
//!
//! - [`dbscan`]: Clustering primitives over raw vectors
//! - [`TopicClusterer`]: Embeds markets and builds a [`ClusterIndex`]

pub mod dbscan;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{ClusterIndex, Market, MarketId, TopicCluster};
use crate::error::{ConfigError, ScorerError};
use crate::port::Embedder;

pub use dbscan::{cosine_similarity, dbscan};

/// Clustering settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// Cosine similarity at which two questions count as neighbours.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    /// Neighbourhood size, including the market itself, for a core point.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
}

const fn default_similarity_threshold() -> f64 {
    0.75
}

const fn default_min_samples() -> usize {
    2
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            min_samples: default_min_samples(),
        }
    }
}

impl ClusterConfig {
    /// DBSCAN radius in cosine distance.
    #[must_use]
    pub fn eps(&self) -> f64 {
        1.0 - self.similarity_threshold
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "clustering.similarity_threshold",
                reason: "must be between 0 and 1".into(),
            });
        }
        if self.min_samples < 2 {
            return Err(ConfigError::InvalidValue {
                field: "clustering.min_samples",
                reason: "must be at least 2".into(),
            });
        }
        Ok(())
    }
}

/// Result of one clustering pass, with the embeddings kept for drift checks.
#[derive(Debug, Clone, Default)]
pub struct TopicClustering {
    index: ClusterIndex,
    questions: HashMap<MarketId, Vec<f32>>,
    criteria: HashMap<MarketId, Vec<f32>>,
}

impl TopicClustering {
    #[must_use]
    pub const fn index(&self) -> &ClusterIndex {
        &self.index
    }

    /// Cosine similarity of the two questions, 0 if either is unknown.
    #[must_use]
    pub fn question_similarity(&self, a: &MarketId, b: &MarketId) -> f64 {
        match (self.questions.get(a), self.questions.get(b)) {
            (Some(x), Some(y)) => cosine_similarity(x, y),
            _ => 0.0,
        }
    }

    /// Cosine similarity of resolution criteria, `None` if either market has none.
    #[must_use]
    pub fn criteria_similarity(&self, a: &MarketId, b: &MarketId) -> Option<f64> {
        match (self.criteria.get(a), self.criteria.get(b)) {
            (Some(x), Some(y)) => Some(cosine_similarity(x, y)),
            _ => None,
        }
    }
}

/// Groups markets by question embedding.
pub struct TopicClusterer {
    embedder: Arc<dyn Embedder>,
    config: ClusterConfig,
}

impl TopicClusterer {
    pub fn new(embedder: Arc<dyn Embedder>, config: ClusterConfig) -> Self {
        Self { embedder, config }
    }

    /// Embed and cluster `markets`. Noise markets belong to no cluster.
    pub async fn cluster(&self, markets: &[Market]) -> Result<TopicClustering, ScorerError> {
        if markets.is_empty() {
            return Ok(TopicClustering::default());
        }

        let criteria_owners: Vec<&Market> = markets
            .iter()
            .filter(|m| m.resolution_criteria().is_some())
            .collect();

        let texts: Vec<String> = markets
            .iter()
            .map(|m| m.question().to_string())
            .chain(
                criteria_owners
                    .iter()
                    .filter_map(|m| m.resolution_criteria().map(str::to_string)),
            )
            .collect();

        let mut vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(ScorerError::Malformed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        let criteria_vectors = vectors.split_off(markets.len());

        let labels = dbscan(&vectors, self.config.eps(), self.config.min_samples);

        let mut grouped: HashMap<usize, Vec<MarketId>> = HashMap::new();
        for (market, label) in markets.iter().zip(&labels) {
            if let Some(label) = label {
                grouped.entry(*label).or_default().push(market.id().clone());
            }
        }
        let mut clusters: Vec<TopicCluster> = grouped
            .into_iter()
            .map(|(label, members)| TopicCluster::new(label, members))
            .collect();
        clusters.sort_by_key(TopicCluster::id);

        let noise = labels.iter().filter(|l| l.is_none()).count();
        debug!(
            embedder = self.embedder.name(),
            markets = markets.len(),
            clusters = clusters.len(),
            noise,
            "Markets clustered"
        );

        Ok(TopicClustering {
            index: ClusterIndex::new(clusters),
            questions: markets.iter().map(|m| m.id().clone()).zip(vectors).collect(),
            criteria: criteria_owners
                .iter()
                .map(|m| m.id().clone())
                .zip(criteria_vectors)
                .collect(),
        })
    }
}
