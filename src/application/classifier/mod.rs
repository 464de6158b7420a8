//! Relationship classification between market pairs.
//!
//! Classification runs in three steps:
//!
//! 1. Temporal proximity filter. Pairs resolving more than
//!    `temporal_threshold_days` apart never reach the scorer.
//! 2. Bidirectional NLI scoring via the [`SimilarityScorer`] port.
//! 3. Label mapping, combining both directions with the topic signal.
//!
//! Classification never fails. Scorer errors and malformed output produce
//! an independent relationship with zero confidence.

pub mod drift;
pub mod temporal;

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Direction, Market, RelationKind, Relationship, TopicSignal};
use crate::error::{ConfigError, ScorerError};
use crate::port::{NliLabel, Score, SimilarityScorer};

pub use drift::assess as assess_drift;
pub use temporal::{proximity, TemporalProximity};

/// Classifier settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Maximum days between resolution dates for a pair to be scored.
    #[serde(default = "default_temporal_threshold_days")]
    pub temporal_threshold_days: i64,
    /// Minimum confidence for a relationship to be considered viable.
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

const fn default_temporal_threshold_days() -> i64 {
    7
}

const fn default_min_confidence() -> f64 {
    0.80
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            temporal_threshold_days: default_temporal_threshold_days(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temporal_threshold_days < 0 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.temporal_threshold_days",
                reason: "must not be negative".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "classifier.min_confidence",
                reason: "must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

/// Maps scorer labels and topic signals to typed relationships.
pub struct RelationshipClassifier {
    scorer: Arc<dyn SimilarityScorer>,
    config: ClassifierConfig,
}

impl RelationshipClassifier {
    pub fn new(scorer: Arc<dyn SimilarityScorer>, config: ClassifierConfig) -> Self {
        Self { scorer, config }
    }

    #[must_use]
    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a pair. `topic` describes whether both markets share a cluster.
    pub async fn classify(&self, a: &Market, b: &Market, topic: TopicSignal) -> Relationship {
        let proximity = temporal::proximity(
            a.resolution_date(),
            b.resolution_date(),
            self.config.temporal_threshold_days,
        );
        if !proximity.is_proximate {
            debug!(
                market_a = %a.id(),
                market_b = %b.id(),
                days_apart = ?proximity.days_apart,
                "Pair outside temporal window"
            );
            return Relationship::independent(
                a.id().clone(),
                b.id().clone(),
                match proximity.days_apart {
                    Some(days) => format!("resolution dates {days} days apart"),
                    None => "resolution date unknown".to_string(),
                },
            );
        }

        let scores = futures_util::future::try_join(
            self.scorer.score(a.question(), b.question()),
            self.scorer.score(b.question(), a.question()),
        )
        .await
        .and_then(|(forward, backward)| {
            check_confidence(forward)?;
            check_confidence(backward)?;
            Ok((forward, backward))
        });

        let (forward, backward) = match scores {
            Ok(scores) => scores,
            Err(e) => {
                warn!(
                    scorer = self.scorer.name(),
                    market_a = %a.id(),
                    market_b = %b.id(),
                    error = %e,
                    "Classification failed closed"
                );
                return Relationship::independent(
                    a.id().clone(),
                    b.id().clone(),
                    format!("scorer failure: {e}"),
                );
            }
        };

        let (kind, confidence) = map_labels(forward, backward, topic);
        let relationship = Relationship::new(
            a.id().clone(),
            b.id().clone(),
            kind,
            confidence,
            format!(
                "forward {} ({:.2}), backward {} ({:.2}), same cluster: {}",
                forward.label,
                forward.confidence,
                backward.label,
                backward.confidence,
                topic.same_cluster
            ),
        );

        debug!(
            market_a = %a.id(),
            market_b = %b.id(),
            kind = %relationship.kind,
            confidence = relationship.confidence,
            temporal_score = proximity.score,
            "Pair classified"
        );
        relationship
    }

    /// Tradeable kind at or above the configured confidence.
    #[must_use]
    pub fn is_viable(&self, relationship: &Relationship) -> bool {
        relationship.is_viable(self.config.min_confidence)
    }
}

fn check_confidence(score: Score) -> Result<(), ScorerError> {
    if score.confidence.is_finite() && (0.0..=1.0).contains(&score.confidence) {
        Ok(())
    } else {
        Err(ScorerError::Malformed(format!(
            "confidence {} outside [0, 1]",
            score.confidence
        )))
    }
}

/// Combine forward and backward labels into a relationship kind.
fn map_labels(forward: Score, backward: Score, topic: TopicSignal) -> (RelationKind, f64) {
    use NliLabel::{Contradiction, Entailment, Neutral};

    let both = forward.confidence.min(backward.confidence);
    match (forward.label, backward.label) {
        (Entailment, Entailment) => (
            RelationKind::Entailment {
                direction: Direction::Symmetric,
            },
            both,
        ),
        (Entailment, Neutral) => (
            RelationKind::Entailment {
                direction: Direction::AImpliesB,
            },
            forward.confidence,
        ),
        (Neutral, Entailment) => (
            RelationKind::Entailment {
                direction: Direction::BImpliesA,
            },
            backward.confidence,
        ),
        // Conflicting evidence.
        (Entailment, Contradiction) | (Contradiction, Entailment) => {
            (RelationKind::Independent, 0.0)
        }
        (Contradiction, Contradiction) if topic.same_cluster && topic.cluster_size == 2 => {
            (RelationKind::Complementary, both)
        }
        (Contradiction, _) | (_, Contradiction) if topic.same_cluster => {
            let confidence = if forward.label == Contradiction && backward.label == Contradiction {
                both
            } else if forward.label == Contradiction {
                forward.confidence
            } else {
                backward.confidence
            };
            (RelationKind::MutuallyExclusive, confidence)
        }
        (Contradiction, _) | (_, Contradiction) => {
            let confidence = if forward.label == Contradiction {
                forward.confidence
            } else {
                backward.confidence
            };
            (RelationKind::Contradiction, confidence)
        }
        (Neutral, Neutral) => (RelationKind::Independent, both),
    }
}
