//! Retrieval-augmented question answering over course materials.
//!
//! The model decides per question whether to search and [`Orchestrator`]
//! bounds how often it may. [`RagSystem`] is the entry point.

pub mod orchestrator;
pub mod prompt;
pub mod system;
pub mod types;

pub use orchestrator::{Completion, Orchestrator, OrchestratorSettings};
pub use system::RagSystem;
pub use types::QueryResponse;
