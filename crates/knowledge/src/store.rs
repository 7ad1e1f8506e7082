//! Course store: embedding-backed access to the catalog and content collections.
//!
//! Searches run as a two-stage pipeline. A course filter is first resolved
//! against the catalog; only a resolved exact title ever reaches the content
//! query, so "no such course" and "nothing matched" stay distinguishable.

use crate::embeddings::EmbeddingProvider;
use crate::types::{Course, CourseChunk, SearchHit, SearchResult};
use crate::vector_index::{ContentFilter, VectorIndex};
use std::collections::BTreeSet;
use std::sync::Arc;
use syllabus_core::{AppError, AppResult};

/// Engine-level operations over a [`VectorIndex`].
#[derive(Clone)]
pub struct CourseStore {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
}

impl CourseStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Map a possibly misspelled or partial course name to an exact catalog title.
    ///
    /// An exact title is returned unchanged. Otherwise the closest catalog
    /// entry wins; `None` only when the catalog is empty.
    pub async fn resolve_course_name(&self, name: &str) -> AppResult<Option<String>> {
        if self.index.course_summary(name)?.is_some() {
            return Ok(Some(name.to_string()));
        }

        let embedding = self.embedder.embed(name).await?;
        let resolved = self
            .index
            .nearest_courses(&embedding, 1)?
            .into_iter()
            .next()
            .map(|(course, score)| {
                tracing::debug!(
                    "Resolved course '{}' to '{}' (score: {:.3})",
                    name,
                    course.title,
                    score
                );
                course.title
            });

        Ok(resolved)
    }

    /// Search course content, optionally restricted to one course and/or lesson.
    ///
    /// Resolution failures and storage faults are reported inside the
    /// returned [`SearchResult`]; embedding provider failures are returned as
    /// `Err`. `max_results` must be positive.
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        max_results: usize,
    ) -> AppResult<SearchResult> {
        if max_results == 0 {
            return Err(AppError::Config(
                "max_results must be greater than zero".to_string(),
            ));
        }

        let course_title = match course_name {
            Some(name) => match self.resolve_course_name(name).await {
                Ok(Some(title)) => Some(title),
                Ok(None) => {
                    tracing::debug!("No course matches '{}', skipping content search", name);
                    return Ok(SearchResult::failed(format!(
                        "No course found matching '{}'",
                        name
                    )));
                }
                Err(e) if e.is_provider_failure() => return Err(e),
                Err(e) => return Ok(SearchResult::failed(format!("Search error: {}", e))),
            },
            None => None,
        };

        let embedding = self.embedder.embed(query).await?;
        let filter = ContentFilter {
            course_title,
            lesson_number,
        };

        match self.index.nearest_chunks(&embedding, &filter, max_results) {
            Ok(matches) => Ok(SearchResult {
                hits: matches
                    .into_iter()
                    .map(|(chunk, score)| SearchHit { chunk, score })
                    .collect(),
                error: None,
            }),
            Err(e) => {
                tracing::warn!("Content search failed: {}", e);
                Ok(SearchResult::failed(format!("Search error: {}", e)))
            }
        }
    }

    /// Index a course and its chunks, replacing any previous version of the course.
    pub async fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> AppResult<()> {
        let catalog_embedding = self.embedder.embed(&course.catalog_text()).await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed_batch(&texts).await?
        };

        self.index
            .replace_course(course, &catalog_embedding, chunks, &embeddings)?;

        tracing::info!(
            "Indexed course '{}' ({} lessons, {} chunks)",
            course.title,
            course.lessons.len(),
            chunks.len()
        );
        Ok(())
    }

    pub fn existing_course_titles(&self) -> AppResult<BTreeSet<String>> {
        Ok(self.index.course_titles()?.into_iter().collect())
    }

    pub fn course_count(&self) -> AppResult<usize> {
        self.index.course_count()
    }

    /// Catalog entry for a course name, resolved fuzzily.
    pub async fn course_outline(&self, name: &str) -> AppResult<Option<Course>> {
        match self.resolve_course_name(name).await? {
            Some(title) => self.index.course_summary(&title),
            None => Ok(None),
        }
    }

    /// Link of a lesson, if the course and lesson are known and the lesson has one.
    pub fn lesson_link(&self, course_title: &str, lesson_number: u32) -> AppResult<Option<String>> {
        Ok(self
            .index
            .course_summary(course_title)?
            .and_then(|course| course.lesson(lesson_number).and_then(|l| l.link.clone())))
    }

    /// Link of a course, if known.
    pub fn course_link(&self, course_title: &str) -> AppResult<Option<String>> {
        Ok(self
            .index
            .course_summary(course_title)?
            .and_then(|course| course.link))
    }

    /// Drop every course and chunk.
    pub fn clear(&self) -> AppResult<()> {
        self.index.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Chunker;
    use crate::embeddings::TrigramProvider;
    use crate::types::{CourseDocument, Lesson, LessonText};
    use crate::test_index::TestIndex;
    use std::sync::atomic::Ordering;

    fn counting_store() -> (CourseStore, Arc<TestIndex>) {
        let index = Arc::new(TestIndex::new());
        let store = CourseStore::new(Arc::new(TrigramProvider::new(384)), index.clone());
        (store, index)
    }

    fn python_course() -> CourseDocument {
        let mut course = Course::new("Intro to Python");
        course.link = Some("https://example.com/python".to_string());
        course.lessons = vec![
            Lesson {
                number: 1,
                title: "Variables".to_string(),
                link: Some("https://example.com/python/1".to_string()),
            },
            Lesson {
                number: 2,
                title: "Functions".to_string(),
                link: None,
            },
        ];

        CourseDocument {
            course,
            blocks: vec![
                LessonText {
                    lesson_number: Some(1),
                    text: "Variables store values in memory.".to_string(),
                },
                LessonText {
                    lesson_number: Some(2),
                    text: "Functions group reusable statements. Functions take parameters."
                        .to_string(),
                },
            ],
        }
    }

    async fn ingest(store: &CourseStore, doc: &CourseDocument) -> usize {
        let chunks = Chunker::new(800, 100).chunk_document(doc);
        store.add_course(&doc.course, &chunks).await.unwrap();
        chunks.len()
    }

    #[tokio::test]
    async fn test_resolve_exact_title_is_identity() {
        let (store, _) = counting_store();
        ingest(&store, &python_course()).await;

        let resolved = store.resolve_course_name("Intro to Python").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("Intro to Python"));
    }

    #[tokio::test]
    async fn test_resolve_partial_name() {
        let (store, _) = counting_store();
        ingest(&store, &python_course()).await;
        let mut other = Course::new("Advanced Retrieval for AI with Chroma");
        other.instructor = Some("Anton".to_string());
        store.add_course(&other, &[]).await.unwrap();

        let resolved = store.resolve_course_name("python intro").await.unwrap();
        assert_eq!(resolved.as_deref(), Some("Intro to Python"));
    }

    #[tokio::test]
    async fn test_resolve_on_empty_catalog() {
        let (store, _) = counting_store();
        assert!(store.resolve_course_name("Anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unresolved_course_skips_content_query() {
        let (store, index) = counting_store();

        let result = store
            .search("what are closures", Some("Rust for Rustaceans"), None, 5)
            .await
            .unwrap();

        assert!(result.is_empty());
        assert_eq!(
            result.error.as_deref(),
            Some("No course found matching 'Rust for Rustaceans'")
        );
        assert_eq!(index.content_queries(), 0);
    }

    #[tokio::test]
    async fn test_search_returns_fewer_than_max_results() {
        let (store, _) = counting_store();
        let doc = CourseDocument {
            course: Course::new("Tiny Course"),
            blocks: vec![
                LessonText {
                    lesson_number: Some(1),
                    text: "Alpha.".to_string(),
                },
                LessonText {
                    lesson_number: Some(2),
                    text: "Beta.".to_string(),
                },
                LessonText {
                    lesson_number: Some(3),
                    text: "Gamma.".to_string(),
                },
            ],
        };
        assert_eq!(ingest(&store, &doc).await, 3);

        let result = store.search("alpha", None, None, 5).await.unwrap();
        assert!(result.error.is_none());
        assert_eq!(result.hits.len(), 3);
        assert!(result.hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_search_with_filters() {
        let (store, _) = counting_store();
        ingest(&store, &python_course()).await;

        let result = store
            .search("parameters", Some("Intro to Python"), Some(2), 5)
            .await
            .unwrap();
        assert!(!result.is_empty());
        assert!(result
            .hits
            .iter()
            .all(|h| h.chunk.lesson_number == Some(2) && h.chunk.course_title == "Intro to Python"));

        let result = store
            .search("parameters", Some("Intro to Python"), Some(9), 5)
            .await
            .unwrap();
        assert!(result.is_empty());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_zero_max_results_is_rejected() {
        let (store, index) = counting_store();
        let err = store.search("anything", None, None, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(index.content_queries(), 0);
    }

    #[tokio::test]
    async fn test_reingesting_is_idempotent() {
        let (store, index) = counting_store();
        let doc = python_course();
        let first = ingest(&store, &doc).await;
        let second = ingest(&store, &doc).await;

        assert_eq!(first, second);
        assert_eq!(
            store.existing_course_titles().unwrap(),
            BTreeSet::from(["Intro to Python".to_string()])
        );
        assert_eq!(index.chunk_count().unwrap(), first);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_list_course() {
        let (store, index) = counting_store();
        let doc = python_course();
        let chunks = Chunker::new(800, 100).chunk_document(&doc);

        index.fail_writes.store(true, Ordering::SeqCst);
        assert!(store.add_course(&doc.course, &chunks).await.is_err());
        assert!(store.existing_course_titles().unwrap().is_empty());
        assert_eq!(index.chunk_count().unwrap(), 0);

        index.fail_writes.store(false, Ordering::SeqCst);
        store.add_course(&doc.course, &chunks).await.unwrap();
        assert!(store
            .existing_course_titles()
            .unwrap()
            .contains("Intro to Python"));
    }

    #[tokio::test]
    async fn test_links_and_outline() {
        let (store, _) = counting_store();
        ingest(&store, &python_course()).await;

        assert_eq!(
            store.lesson_link("Intro to Python", 1).unwrap().as_deref(),
            Some("https://example.com/python/1")
        );
        assert!(store.lesson_link("Intro to Python", 2).unwrap().is_none());
        assert_eq!(
            store.course_link("Intro to Python").unwrap().as_deref(),
            Some("https://example.com/python")
        );

        let outline = store.course_outline("Intro to Python").await.unwrap().unwrap();
        assert_eq!(outline.lessons.len(), 2);

        store.clear().unwrap();
        assert_eq!(store.course_count().unwrap(), 0);
    }
}
