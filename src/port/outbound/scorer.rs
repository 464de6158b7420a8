//! Semantic scoring ports.
//!
//! The underlying NLI and embedding models are black boxes. The classifier
//! consumes only a label with a confidence, and clustering consumes only
//! vectors.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ScorerError;

/// Natural-language-inference label for a premise/hypothesis pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NliLabel {
    Entailment,
    Contradiction,
    Neutral,
}

impl fmt::Display for NliLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entailment => write!(f, "entailment"),
            Self::Contradiction => write!(f, "contradiction"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Scorer output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub label: NliLabel,
    pub confidence: f64,
}

impl Score {
    #[must_use]
    pub const fn new(label: NliLabel, confidence: f64) -> Self {
        Self { label, confidence }
    }
}

/// Scores whether `text_a` entails, contradicts, or is neutral to `text_b`.
#[async_trait]
pub trait SimilarityScorer: Send + Sync {
    /// Scorer name for logging.
    fn name(&self) -> &'static str;

    /// Score one ordered pair.
    async fn score(&self, text_a: &str, text_b: &str) -> Result<Score, ScorerError>;
}

/// Turns texts into embedding vectors, one per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embedder name for logging.
    fn name(&self) -> &'static str;

    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ScorerError>;
}
