//! Tools the language model can call, and the registry that dispatches them.
//!
//! Tools are keyed by [`ToolKind`], so the set of callable names is closed
//! and checked when a tool is registered. Each execution returns its text
//! and, for tools that track provenance, the sources behind that text.

mod outline;
mod search;

pub use outline::CourseOutlineTool;
pub use search::CourseSearchTool;

use crate::types::Source;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use syllabus_core::{AppError, AppResult};
use syllabus_llm::ToolSchema;

/// Identifier of every tool the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ToolKind {
    SearchCourseContent,
    GetCourseOutline,
}

impl ToolKind {
    pub const ALL: [ToolKind; 2] = [ToolKind::SearchCourseContent, ToolKind::GetCourseOutline];

    /// Name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::SearchCourseContent => "search_course_content",
            ToolKind::GetCourseOutline => "get_course_outline",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one tool execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Text handed back to the model
    pub text: String,

    /// Provenance of `text`; `None` for tools that do not track sources
    pub sources: Option<Vec<Source>>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }

    pub fn with_sources(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            text: text.into(),
            sources: Some(sources),
        }
    }
}

/// A capability the language model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    /// Schema advertised to the model.
    fn definition(&self) -> ToolSchema;

    /// Run the tool. Problems the model should hear about (bad arguments,
    /// unknown courses, empty results) come back as text; `Err` is reserved
    /// for failures that should abort the query.
    async fn execute(&self, arguments: Value) -> AppResult<ToolOutput>;
}

/// Registry of tools keyed by kind.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool of the same kind.
    ///
    /// The tool's schema must carry its kind's name and describe a JSON object.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> AppResult<()> {
        let kind = tool.kind();
        let definition = tool.definition();

        if definition.name != kind.name() {
            return Err(AppError::Config(format!(
                "Tool schema named '{}' registered as '{}'",
                definition.name, kind
            )));
        }

        if definition.input_schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(AppError::Config(format!(
                "Tool '{}' must take a JSON object as input",
                kind
            )));
        }

        if self.tools.insert(kind, tool).is_some() {
            tracing::debug!("Replaced tool '{}'", kind);
        }
        Ok(())
    }

    /// Schemas of all registered tools, in kind order.
    pub fn definitions(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Dispatch a model-requested call by wire name.
    pub async fn execute(&self, name: &str, arguments: Value) -> AppResult<ToolOutput> {
        let tool = ToolKind::parse(name)
            .and_then(|kind| self.tools.get(&kind))
            .ok_or_else(|| AppError::UnknownTool(name.to_string()))?;

        tracing::debug!("Executing tool '{}' with {}", name, arguments);
        tool.execute(arguments).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
