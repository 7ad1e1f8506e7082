//! End-to-end tests for ingestion and question answering.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use syllabus_core::{AppConfig, AppError, AppResult};
use syllabus_knowledge::embeddings::TrigramProvider;
use syllabus_knowledge::{RagSystem, SqliteIndex, VectorIndex};
use syllabus_llm::{
    ChatRequest, ChatResponse, LlmClient, LlmUsage, StopReason, ToolCallRequest,
};
use tempfile::TempDir;

const PYTHON_COURSE: &str = "Course Title: Intro to Python
Course Link: https://example.com/python
Course Instructor: Ada Lovelace

Lesson 0: Welcome
Lesson Link: https://example.com/python/0
Python is a general purpose language. It reads almost like English.

Lesson 1: Variables
Lesson Link: https://example.com/python/1
Variables name values. Assignment binds a name to an object.
";

const MCP_COURSE: &str = "Course Title: MCP: Build Rich-Context AI Apps
Course Instructor: Elie Schoppik

Lesson 1: Why MCP
MCP standardizes how applications give context to models.

Lesson 2: Servers
An MCP server exposes tools, resources and prompts.
";

/// Replays canned responses and records every request.
struct ScriptedLlm {
    responses: Mutex<Vec<ChatResponse>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    fn new(mut responses: Vec<ChatResponse>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| AppError::Llm("script exhausted".to_string()))
    }
}

fn answer(text: &str) -> ChatResponse {
    ChatResponse {
        content: text.to_string(),
        tool_calls: Vec::new(),
        model: "scripted".to_string(),
        usage: LlmUsage::default(),
        stop_reason: StopReason::EndTurn,
    }
}

fn tool_call(name: &str, arguments: Value) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        tool_calls: vec![ToolCallRequest {
            id: "call_0".to_string(),
            name: name.to_string(),
            arguments,
        }],
        model: "scripted".to_string(),
        usage: LlmUsage::default(),
        stop_reason: StopReason::ToolUse,
    }
}

fn write_docs(dir: &Path) {
    fs::write(dir.join("python.txt"), PYTHON_COURSE).unwrap();
    fs::write(dir.join("mcp.md"), MCP_COURSE).unwrap();
    fs::write(dir.join("broken.txt"), "No header here.\nLesson 1: Orphan\nText.").unwrap();
    fs::write(dir.join("slides.pdf"), "binary").unwrap();
}

fn system(workspace: &TempDir, llm: Arc<ScriptedLlm>) -> RagSystem {
    let mut config = AppConfig::default();
    config.workspace = workspace.path().to_path_buf();

    let index = SqliteIndex::open(&config.index_path()).unwrap();
    RagSystem::new(
        &config,
        Arc::new(TrigramProvider::new(384)),
        Arc::new(index),
        llm,
    )
    .unwrap()
}

#[tokio::test]
async fn test_folder_ingestion_skips_known_courses() {
    let workspace = TempDir::new().unwrap();
    let docs = workspace.path().join("docs");
    fs::create_dir(&docs).unwrap();
    write_docs(&docs);

    let rag = system(&workspace, ScriptedLlm::new(Vec::new()));

    let stats = rag.add_course_folder(&docs, false).await.unwrap();
    assert_eq!(stats.courses_added, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.skipped, 0);
    assert!(stats.chunks_added >= 4);

    let again = rag.add_course_folder(&docs, false).await.unwrap();
    assert_eq!(again.courses_added, 0);
    assert_eq!(again.skipped, 2);

    let analytics = rag.course_analytics().unwrap();
    assert_eq!(analytics.total_courses, 2);
    assert_eq!(
        analytics.course_titles,
        vec!["Intro to Python", "MCP: Build Rich-Context AI Apps"]
    );

    let rebuilt = rag.add_course_folder(&docs, true).await.unwrap();
    assert_eq!(rebuilt.courses_added, 2);
    assert_eq!(rag.course_analytics().unwrap().total_courses, 2);
}

#[tokio::test]
async fn test_index_survives_reopen() {
    let workspace = TempDir::new().unwrap();
    let doc = workspace.path().join("python.txt");
    fs::write(&doc, PYTHON_COURSE).unwrap();

    {
        let rag = system(&workspace, ScriptedLlm::new(Vec::new()));
        let (course, chunks) = rag.add_course_document(&doc).await.unwrap();
        assert_eq!(course.title, "Intro to Python");
        assert_eq!(course.lessons.len(), 2);
        assert_eq!(chunks, 2);
    }

    let rag = system(&workspace, ScriptedLlm::new(Vec::new()));
    assert_eq!(rag.course_analytics().unwrap().total_courses, 1);
}

#[tokio::test]
async fn test_missing_folder_is_an_error() {
    let workspace = TempDir::new().unwrap();
    let rag = system(&workspace, ScriptedLlm::new(Vec::new()));

    let err = rag
        .add_course_folder(&workspace.path().join("nope"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Ingestion(_)));
}

#[tokio::test]
async fn test_general_question_needs_no_search() {
    let workspace = TempDir::new().unwrap();
    let llm = ScriptedLlm::new(vec![answer("4")]);
    let rag = system(&workspace, llm.clone());

    let response = rag.query("what is 2+2", None).await.unwrap();

    assert_eq!(response.answer, "4");
    assert!(response.sources.is_empty());
    assert_eq!(llm.requests().len(), 1);
    assert!(!response.session_id.is_empty());
}

#[tokio::test]
async fn test_content_question_reports_search_sources() {
    let workspace = TempDir::new().unwrap();
    let docs = workspace.path().join("docs");
    fs::create_dir(&docs).unwrap();
    write_docs(&docs);

    let llm = ScriptedLlm::new(vec![
        tool_call(
            "search_course_content",
            json!({"query": "variables assignment", "course_name": "python"}),
        ),
        answer("Assignment binds a name to an object."),
    ]);
    let rag = system(&workspace, llm.clone());
    rag.add_course_folder(&docs, false).await.unwrap();

    let response = rag
        .query("How do variables work in the Python course?", None)
        .await
        .unwrap();

    assert_eq!(response.answer, "Assignment binds a name to an object.");

    // Sources are exactly the hits of the same search
    let hits = rag
        .store()
        .search("variables assignment", Some("python"), None, 5)
        .await
        .unwrap()
        .hits;
    assert!(!hits.is_empty());
    assert_eq!(response.sources.len(), hits.len());
    for (source, hit) in response.sources.iter().zip(&hits) {
        assert_eq!(source.course, hit.chunk.course_title);
        assert_eq!(source.lesson, hit.chunk.lesson_number);
    }
    assert!(response.sources.iter().all(|s| s.course == "Intro to Python"));
    assert!(response
        .sources
        .iter()
        .any(|s| s.link.as_deref() == Some("https://example.com/python/1")));

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    let tool_turn = serde_json::to_string(&requests[1].messages[2]).unwrap();
    assert!(tool_turn.contains("[Intro to Python - Lesson 1]"));
}

#[tokio::test]
async fn test_unknown_course_is_reported_to_the_model() {
    let workspace = TempDir::new().unwrap();
    let llm = ScriptedLlm::new(vec![
        tool_call(
            "search_course_content",
            json!({"query": "ownership", "course_name": "Rust"}),
        ),
        answer("I could not find that course."),
    ]);
    let rag = system(&workspace, llm.clone());

    let response = rag.query("ownership in the Rust course?", None).await.unwrap();
    assert!(response.sources.is_empty());

    let requests = llm.requests();
    let serialized = serde_json::to_string(&requests[1].messages[2]).unwrap();
    assert!(serialized.contains("No course found matching 'Rust'"));
}

#[tokio::test]
async fn test_follow_up_sees_previous_exchange() {
    let workspace = TempDir::new().unwrap();
    let llm = ScriptedLlm::new(vec![answer("first"), answer("second"), answer("third")]);
    let rag = system(&workspace, llm.clone());

    let first = rag.query("q1", None).await.unwrap();
    let session = first.session_id.clone();
    rag.query("q2", Some(&session)).await.unwrap();
    rag.query("q3", Some(&session)).await.unwrap();

    let requests = llm.requests();
    assert!(!requests[0]
        .system
        .as_deref()
        .unwrap_or_default()
        .contains("Previous conversation:"));
    assert!(requests[1]
        .system
        .as_deref()
        .unwrap_or_default()
        .ends_with("Previous conversation:\nUser: q1\nAssistant: first"));

    // Default window keeps the two most recent exchanges
    let history = rag.sessions().get_history(&session);
    let queries: Vec<&str> = history.iter().map(|e| e.query.as_str()).collect();
    assert_eq!(queries, vec!["q2", "q3"]);
}

#[tokio::test]
async fn test_zero_max_results_is_rejected_at_construction() {
    let workspace = TempDir::new().unwrap();
    let mut config = AppConfig::default();
    config.workspace = workspace.path().to_path_buf();
    config.rag.max_results = 0;

    let index = SqliteIndex::in_memory().unwrap();
    assert_eq!(index.course_count().unwrap(), 0);

    let result = RagSystem::new(
        &config,
        Arc::new(TrigramProvider::new(384)),
        Arc::new(index),
        ScriptedLlm::new(Vec::new()),
    );
    assert!(matches!(result, Err(AppError::Config(_))));
}
