//! LLM provider configuration.
//!
//! The scorer and embedder use an OpenAI-compatible API. The API key is
//! read from `OPENAI_API_KEY` at startup and never from the config file.

use serde::Deserialize;

use crate::error::ConfigError;

/// LLM provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat model used for relationship scoring.
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used for question embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// API root. Override to target a compatible local server.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature. Scoring wants deterministic output.
    #[serde(default)]
    pub temperature: f64,

    /// Maximum tokens in a scoring response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            embedding_model: default_embedding_model(),
            base_url: default_base_url(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "llm.model" });
        }
        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "llm.embedding_model",
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature",
                reason: "must be between 0 and 2".into(),
            });
        }
        Ok(())
    }
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

const fn default_max_tokens() -> usize {
    256
}
