//! Command handlers for the Syllabus CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod courses;
pub mod ingest;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use courses::CoursesCommand;
pub use ingest::IngestCommand;

use syllabus_core::AppError;
use syllabus_knowledge::Source;

/// Hide provider internals behind a generic failure.
pub(crate) fn query_failure(err: AppError) -> AppError {
    if err.is_provider_failure() {
        tracing::error!("Provider failure: {}", err);
        AppError::Other("Query failed: the model provider is unavailable".to_string())
    } else {
        err
    }
}

/// Render sources as a bullet list for terminal output.
pub(crate) fn format_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .map(|source| match source.link {
            Some(ref link) => format!("- {} ({})", source.label(), link),
            None => format!("- {}", source.label()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_failure_hides_provider_errors() {
        let err = query_failure(AppError::Llm("connection refused at 10.0.0.3".to_string()));
        assert!(!err.to_string().contains("10.0.0.3"));

        let err = query_failure(AppError::UnknownTool("x".to_string()));
        assert!(matches!(err, AppError::UnknownTool(_)));
    }

    #[test]
    fn test_format_sources() {
        let sources = vec![
            Source {
                course: "Intro to Python".to_string(),
                lesson: Some(1),
                link: Some("https://example.com/python/1".to_string()),
            },
            Source {
                course: "Intro to Python".to_string(),
                lesson: None,
                link: None,
            },
        ];
        assert_eq!(
            format_sources(&sources),
            "- Intro to Python - Lesson 1 (https://example.com/python/1)\n- Intro to Python"
        );
    }
}
