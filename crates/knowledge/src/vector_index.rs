//! Vector index abstraction for the course catalog and course content.
//!
//! The index holds two logical collections:
//! - *catalog*: one record per course, embedded over its title (and
//!   instructor), used only to resolve fuzzy course names
//! - *content*: one record per chunk, embedded over the prefixed chunk text

use crate::types::{Course, CourseChunk};
use syllabus_core::AppResult;

/// Restricts a content search to one course and/or one lesson.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFilter {
    /// Exact course title
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Atomically replacing a course's catalog entry and chunks
/// - Nearest-neighbour search over both collections
/// - Listing, counting and resetting courses
pub trait VectorIndex: Send + Sync {
    /// Insert or replace the catalog entry for `course.title` together with
    /// every content chunk of that course.
    ///
    /// `chunks` and `embeddings` are parallel slices. Either both collections
    /// are updated or neither is.
    fn replace_course(
        &self,
        course: &Course,
        catalog_embedding: &[f32],
        chunks: &[CourseChunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()>;

    /// Catalog entries closest to the embedding, by descending similarity.
    fn nearest_courses(&self, embedding: &[f32], limit: usize) -> AppResult<Vec<(Course, f32)>>;

    /// Content chunks closest to the embedding within the filter, by descending similarity.
    fn nearest_chunks(
        &self,
        embedding: &[f32],
        filter: &ContentFilter,
        limit: usize,
    ) -> AppResult<Vec<(CourseChunk, f32)>>;

    /// All catalog titles, sorted.
    fn course_titles(&self) -> AppResult<Vec<String>>;

    /// Full catalog entry for an exact title.
    fn course_summary(&self, title: &str) -> AppResult<Option<Course>>;

    fn course_count(&self) -> AppResult<usize>;

    /// Number of stored content chunks.
    fn chunk_count(&self) -> AppResult<usize>;

    /// Remove all courses and chunks.
    fn reset(&self) -> AppResult<()>;
}

/// Calculate cosine similarity between two vectors.
///
/// Mismatched lengths and zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < f32::EPSILON || norm_b < f32::EPSILON {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
