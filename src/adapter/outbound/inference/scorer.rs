//! Natural-language-inference scoring through a completion model.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ScorerError;
use crate::port::{Llm, NliLabel, Score, SimilarityScorer};

/// Scores premise/hypothesis pairs by asking an LLM for an NLI label.
///
/// Scores are cached per ordered pair for the life of the scorer. Market
/// questions rarely change, so repeated scans reuse earlier answers.
pub struct LlmScorer {
    llm: Arc<dyn Llm>,
    cache: DashMap<(String, String), Score>,
}

impl LlmScorer {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            cache: DashMap::new(),
        }
    }

    /// Number of cached pair scores.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn build_prompt(premise: &str, hypothesis: &str) -> String {
        format!(
            r#"You judge logical relationships between prediction market questions.

Premise: "{premise}"
Hypothesis: "{hypothesis}"

Assume the premise resolves YES. Answer with one label:
- entailment: the hypothesis must then also resolve YES
- contradiction: the hypothesis must then resolve NO
- neutral: the hypothesis could resolve either way

Respond with JSON only:
{{"label": "entailment" | "contradiction" | "neutral", "confidence": <number between 0 and 1>}}
"#
        )
    }
}

#[derive(Deserialize)]
struct RawScore {
    label: String,
    confidence: f64,
}

fn parse_label(label: &str) -> Option<NliLabel> {
    match label.trim().to_ascii_lowercase().as_str() {
        "entailment" | "entails" => Some(NliLabel::Entailment),
        "contradiction" | "contradicts" => Some(NliLabel::Contradiction),
        "neutral" => Some(NliLabel::Neutral),
        _ => None,
    }
}

/// Locate the JSON object in a completion that may be wrapped in prose or a
/// fenced code block.
fn extract_json(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let start = start + 7;
        let end = text[start..].find("```").map_or(text.len(), |i| start + i);
        return Some(text[start..end].trim());
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a completion into a [`Score`].
///
/// # Errors
///
/// Returns [`ScorerError::Malformed`] when no JSON object is present, the
/// label is unknown, or the confidence lies outside `[0, 1]`.
pub fn parse_score(response: &str) -> Result<Score, ScorerError> {
    let json = extract_json(response)
        .ok_or_else(|| ScorerError::Malformed("no JSON object in response".into()))?;
    let raw: RawScore =
        serde_json::from_str(json).map_err(|e| ScorerError::Malformed(e.to_string()))?;

    let label = parse_label(&raw.label)
        .ok_or_else(|| ScorerError::Malformed(format!("unknown label {:?}", raw.label)))?;
    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(ScorerError::Malformed(format!(
            "confidence {} outside [0, 1]",
            raw.confidence
        )));
    }
    Ok(Score::new(label, raw.confidence))
}

#[async_trait]
impl SimilarityScorer for LlmScorer {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn score(&self, text_a: &str, text_b: &str) -> Result<Score, ScorerError> {
        let key = (text_a.to_string(), text_b.to_string());
        if let Some(score) = self.cache.get(&key) {
            return Ok(*score);
        }

        let prompt = Self::build_prompt(text_a, text_b);
        let response = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| ScorerError::Unavailable(e.to_string()))?;

        let score = parse_score(&response).map_err(|e| {
            warn!(provider = self.llm.name(), error = %e, "Unparseable scorer response");
            e
        })?;
        debug!(
            provider = self.llm.name(),
            label = %score.label,
            confidence = score.confidence,
            "Scored pair"
        );

        self.cache.insert(key, score);
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::llm::MockLlm;

    #[test]
    fn parses_bare_json() {
        let score = parse_score(r#"{"label": "contradiction", "confidence": 0.93}"#).unwrap();
        assert_eq!(score.label, NliLabel::Contradiction);
        assert!((score.confidence - 0.93).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let response = "Sure.\n```json\n{\"label\": \"Entailment\", \"confidence\": 0.8}\n```\n";
        assert_eq!(parse_score(response).unwrap().label, NliLabel::Entailment);
    }

    #[test]
    fn rejects_unknown_label() {
        let err = parse_score(r#"{"label": "maybe", "confidence": 0.5}"#).unwrap_err();
        assert!(matches!(err, ScorerError::Malformed(_)));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let err = parse_score(r#"{"label": "neutral", "confidence": 1.5}"#).unwrap_err();
        assert!(matches!(err, ScorerError::Malformed(_)));
    }

    #[test]
    fn rejects_text_without_json() {
        assert!(matches!(
            parse_score("I cannot decide"),
            Err(ScorerError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn caches_ordered_pairs() {
        let llm = Arc::new(MockLlm::new(r#"{"label": "neutral", "confidence": 0.7}"#));
        let scorer = LlmScorer::new(llm.clone());

        scorer.score("A?", "B?").await.unwrap();
        scorer.score("A?", "B?").await.unwrap();
        scorer.score("B?", "A?").await.unwrap();

        assert_eq!(llm.prompts.lock().len(), 2);
        assert_eq!(scorer.cached(), 2);
        assert!(llm.prompts.lock()[0].contains("Premise: \"A?\""));
    }

    #[tokio::test]
    async fn provider_failure_is_unavailable() {
        let scorer = LlmScorer::new(Arc::new(MockLlm::failing()));
        let err = scorer.score("A?", "B?").await.unwrap_err();
        assert!(matches!(err, ScorerError::Unavailable(_)));
        assert_eq!(scorer.cached(), 0);
    }

    #[tokio::test]
    async fn malformed_output_is_not_cached() {
        let scorer = LlmScorer::new(Arc::new(MockLlm::new("no idea")));
        assert!(scorer.score("A?", "B?").await.is_err());
        assert_eq!(scorer.cached(), 0);
    }
}
