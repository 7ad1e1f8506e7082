//! Course knowledge engine.
//!
//! Parses course documents, chunks and embeds them into a two-collection
//! SQLite index (a course catalog and course content), and answers questions
//! through a language model that can call retrieval tools.
//!
//! # Example
//! ```no_run
//! use syllabus_core::AppConfig;
//! use syllabus_knowledge::RagSystem;
//!
//! # async fn example() -> syllabus_core::AppResult<()> {
//! let config = AppConfig::load()?;
//! let rag = RagSystem::open(&config)?;
//! rag.add_course_folder(&config.docs_path(), false).await?;
//!
//! let response = rag.query("What does lesson 2 of the MCP course cover?", None).await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod embeddings;
pub mod parser;
pub mod rag;
pub mod session;
pub mod sqlite_index;
pub mod store;
pub mod tools;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod test_index;

// Re-export commonly used types
pub use chunker::Chunker;
pub use embeddings::{create_provider, EmbeddingProvider};
pub use rag::{QueryResponse, RagSystem};
pub use session::ConversationStore;
pub use sqlite_index::SqliteIndex;
pub use store::CourseStore;
pub use tools::{Tool, ToolKind, ToolOutput, ToolRegistry};
pub use types::{
    Course, CourseAnalytics, CourseChunk, Exchange, IngestStats, Lesson, SearchHit, SearchResult,
    Source,
};
pub use vector_index::{ContentFilter, VectorIndex};
