//! Scripted [`SimilarityScorer`] and [`Embedder`] implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ScorerError;
use crate::port::{Embedder, NliLabel, Score, SimilarityScorer};

/// Returns scripted scores per ordered text pair, neutral otherwise.
#[derive(Default)]
pub struct ScriptedScorer {
    scores: HashMap<(String, String), Score>,
    pub calls: Mutex<usize>,
    fail: bool,
}

impl ScriptedScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, a: &str, b: &str, label: NliLabel, confidence: f64) -> Self {
        self.scores
            .insert((a.to_string(), b.to_string()), Score::new(label, confidence));
        self
    }

    /// Script the same label in both directions.
    pub fn with_both(self, a: &str, b: &str, label: NliLabel, confidence: f64) -> Self {
        self.with(a, b, label, confidence).with(b, a, label, confidence)
    }
}

#[async_trait]
impl SimilarityScorer for ScriptedScorer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn score(&self, text_a: &str, text_b: &str) -> Result<Score, ScorerError> {
        *self.calls.lock() += 1;
        if self.fail {
            return Err(ScorerError::Unavailable("scripted failure".into()));
        }
        Ok(self
            .scores
            .get(&(text_a.to_string(), text_b.to_string()))
            .copied()
            .unwrap_or(Score::new(NliLabel::Neutral, 0.9)))
    }
}

/// Returns scripted vectors per text, a zero vector otherwise.
#[derive(Default)]
pub struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ScorerError> {
        if self.fail {
            return Err(ScorerError::Unavailable("scripted failure".into()));
        }
        Ok(texts
            .iter()
            .map(|t| self.vectors.get(t).cloned().unwrap_or_else(|| vec![0.0, 0.0]))
            .collect())
    }
}
