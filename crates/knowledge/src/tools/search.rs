use super::{Tool, ToolKind, ToolOutput};
use crate::store::CourseStore;
use crate::types::{SearchResult, Source};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use syllabus_core::AppResult;
use syllabus_llm::ToolSchema;

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// `search_course_content`: ranked retrieval over course content.
pub struct CourseSearchTool {
    store: CourseStore,
    max_results: usize,
}

impl CourseSearchTool {
    pub fn new(store: CourseStore, max_results: usize) -> Self {
        Self { store, max_results }
    }

    fn format_results(&self, result: &SearchResult) -> AppResult<(String, Vec<Source>)> {
        let mut blocks = Vec::with_capacity(result.hits.len());
        let mut sources = Vec::with_capacity(result.hits.len());

        for hit in &result.hits {
            let chunk = &hit.chunk;
            blocks.push(format!("{}\n{}", chunk.label(), chunk.body()));

            let lesson_link = match chunk.lesson_number {
                Some(n) => self.store.lesson_link(&chunk.course_title, n)?,
                None => None,
            };
            let link = match lesson_link {
                Some(link) => Some(link),
                None => self.store.course_link(&chunk.course_title)?,
            };

            sources.push(Source {
                course: chunk.course_title.clone(),
                lesson: chunk.lesson_number,
                link,
            });
        }

        Ok((blocks.join("\n\n"), sources))
    }
}

fn no_content_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = "No relevant content found".to_string();
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::SearchCourseContent
    }

    fn definition(&self) -> ToolSchema {
        ToolSchema {
            name: self.kind().name().to_string(),
            description: "Search course materials with smart course name matching and lesson filtering".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> AppResult<ToolOutput> {
        let args: SearchArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                return Ok(ToolOutput::text(format!(
                    "Invalid arguments for {}: {}",
                    self.kind(),
                    e
                )))
            }
        };

        let result = self
            .store
            .search(
                &args.query,
                args.course_name.as_deref(),
                args.lesson_number,
                self.max_results,
            )
            .await?;

        if let Some(error) = result.error {
            return Ok(ToolOutput::with_sources(error, Vec::new()));
        }

        if result.is_empty() {
            return Ok(ToolOutput::with_sources(
                no_content_message(args.course_name.as_deref(), args.lesson_number),
                Vec::new(),
            ));
        }

        match self.format_results(&result) {
            Ok((text, sources)) => {
                tracing::debug!("Search returned {} results", sources.len());
                Ok(ToolOutput::with_sources(text, sources))
            }
            Err(e) if e.is_provider_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Failed to look up source links: {}", e);
                Ok(ToolOutput::with_sources(
                    format!("Search error: {}", e),
                    Vec::new(),
                ))
            }
        }
    }
}
