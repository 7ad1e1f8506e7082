//! System prompt for course question answering.

use handlebars::Handlebars;
use serde_json::json;
use syllabus_core::{AppError, AppResult};

const SYSTEM_TEMPLATE: &str = "You are a course assistant with tools for looking up the user's course materials.

Tools:
- search_course_content: find passages in course content. Optionally narrow it to a course (partial names work) and a lesson number.
- get_course_outline: get a course's title, link, instructor and lesson list. Use it for questions about course structure or what lessons a course has.

Instructions:
- Answer general knowledge questions directly, without using tools
- Search before answering questions about specific course content
- You may use tools in at most {{max_tool_rounds}} rounds per question; use a later round only when an earlier result tells you what to look up next
- If the tools find nothing relevant, say so plainly
- Do not mention searches, tools, or \"the results\" in your answer
- Keep answers brief and focused, with an example when it helps understanding{{#if history}}

Previous conversation:
{{history}}{{/if}}";

/// Render the system prompt, appending the conversation so far when present.
pub fn system_prompt(history: Option<&str>, max_tool_rounds: usize) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("system", SYSTEM_TEMPLATE)
        .map_err(|e| AppError::Other(format!("Failed to register system prompt: {}", e)))?;

    handlebars
        .render(
            "system",
            &json!({
                "history": history,
                "max_tool_rounds": max_tool_rounds,
            }),
        )
        .map_err(|e| AppError::Other(format!("Failed to render system prompt: {}", e)))
}

/// The user turn sent for a question.
pub fn user_prompt(query: &str) -> String {
    format!("Answer this question about course materials: {}", query)
}
