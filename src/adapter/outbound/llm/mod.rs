//! LLM provider adapters.
//!
//! - [`openai`]: Chat completions for the [`Llm`](crate::port::Llm) port and
//!   embeddings for the [`Embedder`](crate::port::Embedder) port.

pub mod openai;

pub use openai::OpenAi;
