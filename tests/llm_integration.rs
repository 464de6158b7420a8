//! Live provider checks. Require `OPENAI_API_KEY`.
//!
//! Run with: `cargo test --features integration-tests -- --ignored`

#![cfg(feature = "integration-tests")]

use std::sync::Arc;

use arbiter::adapter::outbound::inference::LlmScorer;
use arbiter::adapter::outbound::llm::OpenAi;
use arbiter::infrastructure::config::llm::LlmConfig;
use arbiter::port::{Embedder, Llm, NliLabel, SimilarityScorer};

fn client() -> OpenAi {
    let _ = dotenvy::dotenv();
    OpenAi::from_env(&LlmConfig::default()).expect("OPENAI_API_KEY must be set")
}

#[tokio::test]
#[ignore]
async fn completion_round_trip() {
    let reply = client().complete("Reply with the single word: ready").await.unwrap();
    assert!(reply.to_lowercase().contains("ready"));
}

#[tokio::test]
#[ignore]
async fn scorer_labels_exclusive_candidates() {
    let scorer = LlmScorer::new(Arc::new(client()));

    let score = scorer
        .score(
            "Will the Democratic candidate win the 2026 Ohio Senate race?",
            "Will the Republican candidate win the 2026 Ohio Senate race?",
        )
        .await
        .unwrap();

    assert_eq!(score.label, NliLabel::Contradiction);
}

#[tokio::test]
#[ignore]
async fn embeddings_place_related_questions_closer() {
    let vectors = client()
        .embed(&[
            "Will the Fed cut rates in December?".to_string(),
            "Will the Federal Reserve lower rates at its December meeting?".to_string(),
            "Will BTC close above $150k this year?".to_string(),
        ])
        .await
        .unwrap();

    let close = arbiter::application::cluster::cosine_similarity(&vectors[0], &vectors[1]);
    let far = arbiter::application::cluster::cosine_similarity(&vectors[0], &vectors[2]);
    assert!(close > far);
}
