//! Text completion port.
//!
//! The relationship scorer is built on top of a chat-style completion
//! model. Keeping the model behind a trait lets the scorer's prompt and
//! parsing be tested without network access.

use async_trait::async_trait;

use crate::error::Result;

/// Client for large language model text completion.
///
/// Implementations handle authentication and transport. They must be
/// `Send + Sync` because pairs are scored concurrently.
#[async_trait]
pub trait Llm: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &'static str;

    /// Send a completion request and return the generated text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response carries no text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
