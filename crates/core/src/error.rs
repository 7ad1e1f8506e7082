//! Error types for Syllabus.
//!
//! This module defines a unified error enum that covers all error categories
//! in the engine: configuration, I/O, language model and embedding providers,
//! the course index, document ingestion, and tool dispatch.

use thiserror::Error;

/// Unified error type for Syllabus.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
///
/// Note that a course name that cannot be resolved, or a search with no
/// matches, is *not* an error: both flow back to the language model as tool
/// output text. Only integrity faults and provider failures end up here.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Language model provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Embedding provider errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index and retrieval errors
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// A course document could not be ingested
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// The model asked for a tool nobody registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from an external model provider.
    ///
    /// The transport boundary reports these as a generic query failure.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, AppError::Llm(_) | AppError::Embedding(_))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
