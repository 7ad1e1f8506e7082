//! Instrumented index wrapper shared by unit tests.

use crate::sqlite_index::SqliteIndex;
use crate::types::{Course, CourseChunk};
use crate::vector_index::{ContentFilter, VectorIndex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use syllabus_core::{AppError, AppResult};

/// In-memory index that counts content queries and can be told to fail.
pub(crate) struct TestIndex {
    inner: SqliteIndex,
    pub content_queries: AtomicUsize,
    pub fail_catalog_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl TestIndex {
    pub fn new() -> Self {
        Self {
            inner: SqliteIndex::in_memory().unwrap(),
            content_queries: AtomicUsize::new(0),
            fail_catalog_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn content_queries(&self) -> usize {
        self.content_queries.load(Ordering::SeqCst)
    }
}

impl VectorIndex for TestIndex {
    fn replace_course(
        &self,
        course: &Course,
        catalog_embedding: &[f32],
        chunks: &[CourseChunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Knowledge("database is locked".to_string()));
        }
        self.inner
            .replace_course(course, catalog_embedding, chunks, embeddings)
    }

    fn nearest_courses(&self, embedding: &[f32], limit: usize) -> AppResult<Vec<(Course, f32)>> {
        self.inner.nearest_courses(embedding, limit)
    }

    fn nearest_chunks(
        &self,
        embedding: &[f32],
        filter: &ContentFilter,
        limit: usize,
    ) -> AppResult<Vec<(CourseChunk, f32)>> {
        self.content_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.nearest_chunks(embedding, filter, limit)
    }

    fn course_titles(&self) -> AppResult<Vec<String>> {
        self.inner.course_titles()
    }

    fn course_summary(&self, title: &str) -> AppResult<Option<Course>> {
        if self.fail_catalog_reads.load(Ordering::SeqCst) {
            return Err(AppError::Knowledge("catalog read failed".to_string()));
        }
        self.inner.course_summary(title)
    }

    fn course_count(&self) -> AppResult<usize> {
        self.inner.course_count()
    }

    fn chunk_count(&self) -> AppResult<usize> {
        self.inner.chunk_count()
    }

    fn reset(&self) -> AppResult<()> {
        self.inner.reset()
    }
}
