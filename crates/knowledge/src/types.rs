//! Course knowledge type definitions.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A lesson inside a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number, unique within its course (not necessarily contiguous)
    pub number: u32,

    /// Lesson title
    pub title: String,

    /// Optional lesson link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Course metadata. Stored whole in the catalog collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Course title, the unique identifier of a course
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,

    /// Lessons in document order
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Create a course with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    /// Find a lesson by number.
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }

    /// Text embedded into the catalog for fuzzy name resolution.
    pub fn catalog_text(&self) -> String {
        match self.instructor {
            Some(ref instructor) => format!("{} {}", self.title, instructor),
            None => self.title.clone(),
        }
    }
}

/// Raw text of one lesson (or of a lesson-agnostic document body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonText {
    /// `None` when the document has no lesson markers
    pub lesson_number: Option<u32>,
    pub text: String,
}

/// A parsed course document, ready for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDocument {
    pub course: Course,
    pub blocks: Vec<LessonText>,
}

/// A retrievable unit of course content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Owning course title
    pub course_title: String,

    /// Owning lesson, `None` for lesson-agnostic text
    pub lesson_number: Option<u32>,

    /// Course-wide position, monotonically increasing
    pub chunk_index: u32,

    /// Chunk text prefixed with its course/lesson header
    pub content: String,

    /// Byte range of the chunk body within the lesson text
    pub byte_range: Range<usize>,
}

impl CourseChunk {
    /// The header that prefixes every chunk of a lesson.
    pub fn header(course_title: &str, lesson_number: Option<u32>) -> String {
        match lesson_number {
            Some(n) => format!("Course {} Lesson {} content:", course_title, n),
            None => format!("Course {} content:", course_title),
        }
    }

    /// Chunk text without its header.
    pub fn body(&self) -> &str {
        let header = Self::header(&self.course_title, self.lesson_number);
        self.content
            .strip_prefix(header.as_str())
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .unwrap_or(&self.content)
    }

    /// Display label, e.g. `[Intro to Python - Lesson 2]`.
    pub fn label(&self) -> String {
        match self.lesson_number {
            Some(n) => format!("[{} - Lesson {}]", self.course_title, n),
            None => format!("[{}]", self.course_title),
        }
    }
}

/// A single ranked search match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk: CourseChunk,

    /// Cosine similarity, higher is closer
    pub score: f32,
}

/// Outcome of a content search.
///
/// A failed course resolution or a storage fault is reported in `error`;
/// an empty `hits` list with no error is simply "nothing matched".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub hits: Vec<SearchHit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    /// A result carrying an error message and no hits.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Provenance of an answer fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Course title
    pub course: String,

    /// Lesson number, when the chunk belongs to a lesson
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson: Option<u32>,

    /// Lesson link when known, else course link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Source {
    /// Display label, e.g. `Intro to Python - Lesson 2`.
    pub fn label(&self) -> String {
        match self.lesson {
            Some(n) => format!("{} - Lesson {}", self.course, n),
            None => self.course.clone(),
        }
    }
}

/// One question/answer pair remembered by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
}

/// Statistics from a folder ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Courses newly indexed
    pub courses_added: usize,

    /// Chunks written for the new courses
    pub chunks_added: usize,

    /// Documents whose course was already indexed
    pub skipped: usize,

    /// Documents that failed to parse or index
    pub failed: usize,
}

/// Catalog overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
