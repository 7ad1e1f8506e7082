use super::{Tool, ToolKind, ToolOutput};
use crate::store::CourseStore;
use crate::types::Course;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use syllabus_core::AppResult;
use syllabus_llm::ToolSchema;

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// `get_course_outline`: a course's title, link, instructor and lesson list.
pub struct CourseOutlineTool {
    store: CourseStore,
}

impl CourseOutlineTool {
    pub fn new(store: CourseStore) -> Self {
        Self { store }
    }
}

fn format_outline(course: &Course) -> String {
    let mut lines = vec![
        format!("Course: {}", course.title),
        format!("Link: {}", course.link.as_deref().unwrap_or("n/a")),
        format!(
            "Instructor: {}",
            course.instructor.as_deref().unwrap_or("n/a")
        ),
        format!("Lessons ({}):", course.lessons.len()),
    ];
    lines.extend(
        course
            .lessons
            .iter()
            .map(|lesson| format!("- Lesson {}: {}", lesson.number, lesson.title)),
    );
    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn kind(&self) -> ToolKind {
        ToolKind::GetCourseOutline
    }

    fn definition(&self) -> ToolSchema {
        ToolSchema {
            name: self.kind().name().to_string(),
            description: "Get a course outline: title, link, instructor and the numbered list of lessons".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work)"
                    }
                },
                "required": ["course_name"]
            }),
        }
    }

    async fn execute(&self, arguments: Value) -> AppResult<ToolOutput> {
        let args: OutlineArgs = match serde_json::from_value(arguments) {
            Ok(args) => args,
            Err(e) => {
                return Ok(ToolOutput::text(format!(
                    "Invalid arguments for {}: {}",
                    self.kind(),
                    e
                )))
            }
        };

        match self.store.course_outline(&args.course_name).await {
            Ok(Some(course)) => Ok(ToolOutput::text(format_outline(&course))),
            Ok(None) => Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                args.course_name
            ))),
            Err(e) if e.is_provider_failure() => Err(e),
            Err(e) => {
                tracing::warn!("Outline lookup failed: {}", e);
                Ok(ToolOutput::text(format!("Outline error: {}", e)))
            }
        }
    }
}
