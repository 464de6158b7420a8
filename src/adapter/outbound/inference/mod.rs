//! LLM-backed semantic scoring.
//!
//! Implements the [`SimilarityScorer`](crate::port::SimilarityScorer) port on
//! top of any [`Llm`](crate::port::Llm) completion backend.

pub mod scorer;

pub use scorer::LlmScorer;
