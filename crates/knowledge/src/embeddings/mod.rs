//! Embedding providers.
//!
//! Course titles and chunk texts are embedded through a provider-agnostic
//! trait. The offline trigram provider is the default; Ollama serves neural
//! embeddings from a local runtime.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{OllamaProvider, TrigramProvider};
