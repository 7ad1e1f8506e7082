//! Course question answering system.

use super::orchestrator::{Orchestrator, OrchestratorSettings};
use super::types::QueryResponse;
use crate::chunker::Chunker;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::parser::{self, ContentType};
use crate::session::ConversationStore;
use crate::sqlite_index::SqliteIndex;
use crate::store::CourseStore;
use crate::tools::{CourseOutlineTool, CourseSearchTool, ToolRegistry};
use crate::types::{Course, CourseAnalytics, CourseDocument, IngestStats};
use crate::vector_index::VectorIndex;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use syllabus_core::{AppConfig, AppError, AppResult};
use syllabus_llm::{create_client, LlmClient};
use walkdir::WalkDir;

/// Entry point for ingestion and querying.
pub struct RagSystem {
    store: CourseStore,
    chunker: Chunker,
    sessions: ConversationStore,
    orchestrator: Orchestrator,
}

impl RagSystem {
    /// Build the system from explicit collaborators.
    ///
    /// Registers both course tools and validates the RAG settings first.
    pub fn new(
        config: &AppConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        llm: Arc<dyn LlmClient>,
    ) -> AppResult<Self> {
        let settings = &config.rag;
        settings.validate()?;

        let store = CourseStore::new(embedder, index);

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(
            store.clone(),
            settings.max_results,
        )))?;
        registry.register(Arc::new(CourseOutlineTool::new(store.clone())))?;

        let orchestrator = Orchestrator::new(
            llm,
            Some(Arc::new(registry)),
            OrchestratorSettings::from_settings(&config.model, settings),
        );

        Ok(Self {
            store,
            chunker: Chunker::from_settings(settings),
            sessions: ConversationStore::new(settings.max_history),
            orchestrator,
        })
    }

    /// Build the system from configuration: on-disk index, configured
    /// embedding provider and language model.
    pub fn open(config: &AppConfig) -> AppResult<Self> {
        config.ensure_syllabus_dir()?;

        let index = SqliteIndex::open(&config.index_path())?;
        let embedder = create_provider(&config.rag.embedding)?;
        let llm = create_client(
            &config.provider,
            config.resolve_endpoint(&config.provider).as_deref(),
            config.resolve_api_key(&config.provider).as_deref(),
        )?;

        tracing::debug!(
            "Opened course index at {:?} (embeddings: {}/{}, model: {}/{})",
            config.index_path(),
            embedder.provider_name(),
            embedder.model_name(),
            llm.provider_name(),
            config.model
        );

        Self::new(config, embedder, Arc::new(index), llm)
    }

    /// Answer a question, remembering the exchange in its session.
    ///
    /// A new session is created when `session_id` is `None`.
    pub async fn query(&self, query: &str, session_id: Option<&str>) -> AppResult<QueryResponse> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session(),
        };

        tracing::info!("Query in session {}: {}", session_id, query);

        let history = self.sessions.format_history(&session_id);
        let completion = self.orchestrator.run(query, history.as_deref()).await?;

        self.sessions.append(&session_id, query, &completion.answer);

        Ok(QueryResponse {
            answer: completion.answer,
            sources: completion.sources,
            session_id,
        })
    }

    /// Parse, chunk and index one course document.
    ///
    /// Returns the course and the number of chunks written.
    pub async fn add_course_document(&self, path: &Path) -> AppResult<(Course, usize)> {
        let doc = parser::parse_file(path)?;
        let chunks = self.index_document(&doc).await?;
        Ok((doc.course, chunks))
    }

    /// Index every supported document under `dir`.
    ///
    /// Courses already in the index are skipped. A document that fails to
    /// parse or index is logged and counted, and ingestion moves on.
    pub async fn add_course_folder(&self, dir: &Path, clear_existing: bool) -> AppResult<IngestStats> {
        if !dir.is_dir() {
            return Err(AppError::Ingestion(format!(
                "Course folder does not exist: {:?}",
                dir
            )));
        }

        let start = Instant::now();

        if clear_existing {
            tracing::info!("Clearing existing courses before ingestion");
            self.store.clear()?;
        }

        let mut existing = self.store.existing_course_titles()?;
        let mut stats = IngestStats::default();

        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() || !ContentType::from_path(path).is_supported() {
                continue;
            }

            let doc = match parser::parse_file(path) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", path, e);
                    stats.failed += 1;
                    continue;
                }
            };

            if existing.contains(&doc.course.title) {
                tracing::debug!("Course already indexed: {}", doc.course.title);
                stats.skipped += 1;
                continue;
            }

            match self.index_document(&doc).await {
                Ok(chunks) => {
                    stats.courses_added += 1;
                    stats.chunks_added += chunks;
                    existing.insert(doc.course.title);
                }
                Err(e) => {
                    tracing::warn!("Failed to index {:?}: {}", path, e);
                    stats.failed += 1;
                }
            }
        }

        tracing::info!(
            "Ingestion completed: {} courses, {} chunks, {} skipped, {} failed in {:.2}s",
            stats.courses_added,
            stats.chunks_added,
            stats.skipped,
            stats.failed,
            start.elapsed().as_secs_f64()
        );

        Ok(stats)
    }

    /// Number of indexed courses and their titles.
    pub fn course_analytics(&self) -> AppResult<CourseAnalytics> {
        let course_titles: Vec<String> = self.store.existing_course_titles()?.into_iter().collect();
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    pub fn sessions(&self) -> &ConversationStore {
        &self.sessions
    }

    pub fn store(&self) -> &CourseStore {
        &self.store
    }

    async fn index_document(&self, doc: &CourseDocument) -> AppResult<usize> {
        let chunks = self.chunker.chunk_document(doc);
        self.store.add_course(&doc.course, &chunks).await?;
        Ok(chunks.len())
    }
}
