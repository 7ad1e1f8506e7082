//! Course document parsing.
//!
//! A course document is plain UTF-8 text with a short header followed by
//! lesson sections:
//!
//! ```text
//! Course Title: Intro to Python
//! Course Link: https://example.com/python
//! Course Instructor: Ada Lovelace
//!
//! Lesson 0: Welcome
//! Lesson Link: https://example.com/python/0
//! Lesson text...
//! ```

use crate::types::{Course, CourseDocument, Lesson, LessonText};
use std::fs;
use std::path::Path;
use syllabus_core::{AppError, AppResult};

const TITLE_PREFIX: &str = "course title:";
const LINK_PREFIX: &str = "course link:";
const INSTRUCTOR_PREFIX: &str = "course instructor:";
const LESSON_LINK_PREFIX: &str = "lesson link:";

/// Content type classification for ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    PlainText,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Read and parse a course document from disk.
pub fn parse_file(path: &Path) -> AppResult<CourseDocument> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

    parse_course_document(&raw)
        .map_err(|e| AppError::Ingestion(format!("{:?}: {}", path, ingestion_message(&e))))
}

fn ingestion_message(err: &AppError) -> String {
    match err {
        AppError::Ingestion(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// Parse course document text into course metadata and lesson texts.
///
/// Fails with `AppError::Ingestion` when the `Course Title:` header is
/// missing or empty. Without lesson markers the body after the header
/// becomes a single lesson-agnostic block.
pub fn parse_course_document(text: &str) -> AppResult<CourseDocument> {
    let mut course: Option<Course> = None;
    let mut link = None;
    let mut instructor = None;
    let mut preamble = Vec::new();

    let mut lessons: Vec<Lesson> = Vec::new();
    let mut blocks: Vec<LessonText> = Vec::new();
    let mut current: Option<(u32, Vec<&str>)> = None;
    let mut expect_lesson_link = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some((number, title)) = parse_lesson_marker(trimmed) {
            if let Some((n, lines)) = current.take() {
                push_block(&mut blocks, Some(n), &lines);
            }

            if !lessons.iter().any(|l| l.number == number) {
                lessons.push(Lesson {
                    number,
                    title,
                    link: None,
                });
            } else {
                tracing::debug!("Lesson {} repeated, appending its text", number);
            }

            current = Some((number, Vec::new()));
            expect_lesson_link = true;
            continue;
        }

        if let Some((number, ref mut lines)) = current {
            if expect_lesson_link && !trimmed.is_empty() {
                expect_lesson_link = false;
                if let Some(value) = header_value(trimmed, LESSON_LINK_PREFIX) {
                    if let Some(lesson) = lessons.iter_mut().find(|l| l.number == number) {
                        if lesson.link.is_none() && !value.is_empty() {
                            lesson.link = Some(value.to_string());
                        }
                    }
                    continue;
                }
            }
            lines.push(line);
            continue;
        }

        // Still in the header section
        if let Some(value) = header_value(trimmed, TITLE_PREFIX) {
            if course.is_none() && !value.is_empty() {
                course = Some(Course::new(value));
            }
        } else if let Some(value) = header_value(trimmed, LINK_PREFIX) {
            link = non_empty(value);
        } else if let Some(value) = header_value(trimmed, INSTRUCTOR_PREFIX) {
            instructor = non_empty(value);
        } else {
            preamble.push(line);
        }
    }

    if let Some((n, lines)) = current.take() {
        push_block(&mut blocks, Some(n), &lines);
    }

    let mut course = course.ok_or_else(|| {
        AppError::Ingestion("Missing or empty 'Course Title:' header".to_string())
    })?;
    course.link = link;
    course.instructor = instructor;

    if lessons.is_empty() {
        push_block(&mut blocks, None, &preamble);
    }
    course.lessons = lessons;

    tracing::debug!(
        "Parsed course '{}' with {} lessons",
        course.title,
        course.lessons.len()
    );

    Ok(CourseDocument { course, blocks })
}

/// Record lesson text, merging repeated lesson numbers into one block.
fn push_block(blocks: &mut Vec<LessonText>, lesson_number: Option<u32>, lines: &[&str]) {
    let text = lines.join("\n").trim().to_string();

    if let Some(existing) = blocks
        .iter_mut()
        .find(|b| lesson_number.is_some() && b.lesson_number == lesson_number)
    {
        if !text.is_empty() {
            if !existing.text.is_empty() {
                existing.text.push('\n');
            }
            existing.text.push_str(&text);
        }
        return;
    }

    blocks.push(LessonText {
        lesson_number,
        text,
    });
}

/// Parse `Lesson <n>: <title>` (case-insensitive keyword).
fn parse_lesson_marker(line: &str) -> Option<(u32, String)> {
    let keyword = line.get(..7)?;
    if !keyword.eq_ignore_ascii_case("lesson ") {
        return None;
    }

    let rest = &line[7..];
    let colon = rest.find(':')?;
    let number = rest[..colon].trim().parse::<u32>().ok()?;
    let title = rest[colon + 1..].trim().to_string();

    Some((number, title))
}

/// Value of a `Prefix: value` header line, matched case-insensitively.
fn header_value<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim())
    } else {
        None
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
