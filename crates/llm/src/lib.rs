//! LLM integration crate for Syllabus.
//!
//! This crate provides a provider-agnostic, tool-aware chat abstraction for
//! Large Language Models. Conversations are lists of messages made of content
//! blocks; providers translate them to their wire formats.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default), `/api/chat`
//! - **Claude**: Anthropic Messages API
//!
//! # Example
//! ```no_run
//! use syllabus_llm::{ChatMessage, ChatRequest, LlmClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2", vec![ChatMessage::user("Hello, world!")]);
//! let response = client.chat(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{
    ChatMessage, ChatRequest, ChatResponse, ContentBlock, LlmClient, LlmUsage, Role, StopReason,
    ToolCallRequest, ToolSchema,
};
pub use factory::create_client;
pub use providers::{ClaudeClient, OllamaClient};
pub use types::ProviderType;
