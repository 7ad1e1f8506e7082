//! Sentence-based chunking with overlap.
//!
//! Lesson text is split on Unicode sentence boundaries. Sentences are packed
//! greedily into chunks of at most `chunk_size` characters, and each chunk
//! after the first repeats trailing whole sentences of its predecessor (up to
//! `chunk_overlap` characters) so context survives the cut. Only a single
//! sentence longer than `chunk_size` may exceed the budget; repeated
//! sentences are dropped before that happens.

use crate::types::{CourseChunk, CourseDocument};
use std::ops::Range;
use syllabus_core::RagSettings;
use unicode_segmentation::UnicodeSegmentation;

/// A sentence slice: byte range plus length in characters.
#[derive(Debug, Clone)]
struct Sentence {
    range: Range<usize>,
    chars: usize,
}

/// Splits course documents into overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Sizes are validated by `RagSettings::validate`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn from_settings(settings: &RagSettings) -> Self {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    /// Chunk every lesson of a document. `chunk_index` runs across the whole course.
    pub fn chunk_document(&self, doc: &CourseDocument) -> Vec<CourseChunk> {
        let title = &doc.course.title;
        let mut chunks = Vec::new();
        let mut index = 0u32;

        for block in &doc.blocks {
            let header = CourseChunk::header(title, block.lesson_number);

            for range in self.split(&block.text) {
                let body = block.text[range.clone()].trim();
                chunks.push(CourseChunk {
                    course_title: title.clone(),
                    lesson_number: block.lesson_number,
                    chunk_index: index,
                    content: format!("{} {}", header, body),
                    byte_range: range,
                });
                index += 1;
            }
        }

        tracing::debug!(
            "Chunked course '{}' into {} chunks (size: {}, overlap: {})",
            title,
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }

    /// Split text into chunk byte ranges aligned to sentence boundaries.
    ///
    /// Consecutive ranges overlap by whole sentences; the last range ends at
    /// `text.len()`. Whitespace-only text yields no ranges.
    pub fn split(&self, text: &str) -> Vec<Range<usize>> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let sentences: Vec<Sentence> = text
            .split_sentence_bound_indices()
            .map(|(start, s)| Sentence {
                range: start..start + s.len(),
                chars: s.chars().count(),
            })
            .collect();

        let mut ranges = Vec::new();
        let mut start = 0;
        // First sentence not yet covered by an earlier chunk
        let mut fresh = 0;

        while fresh < sentences.len() {
            let mut end = start;
            let mut size = 0;

            while end < sentences.len() {
                let next = sentences[end].chars;
                if end > fresh && size + next > self.chunk_size {
                    break;
                }
                size += next;
                end += 1;
            }

            ranges.push(sentences[start].range.start..sentences[end - 1].range.end);

            if end == sentences.len() {
                break;
            }

            let mut carried = self.overlap_sentences(&sentences[start..end]);
            let next = sentences[end].chars;
            while carried > 0 {
                let repeated: usize = sentences[end - carried..end].iter().map(|s| s.chars).sum();
                if repeated + next <= self.chunk_size {
                    break;
                }
                carried -= 1;
            }

            fresh = end;
            start = end - carried;
        }

        ranges
    }

    /// Number of trailing sentences of a chunk to repeat in the next one.
    fn overlap_sentences(&self, chunk: &[Sentence]) -> usize {
        if self.chunk_overlap == 0 {
            return 0;
        }

        let mut carried = 0;
        let mut size = 0;
        for sentence in chunk.iter().rev() {
            if size + sentence.chars > self.chunk_overlap {
                break;
            }
            size += sentence.chars;
            carried += 1;
        }

        // At least the final sentence of a multi-sentence chunk, never the
        // whole chunk. The caller trims this to fit the budget.
        carried.max(1).min(chunk.len().saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Course, LessonText};

    fn sentences(n: usize) -> String {
        (0..n)
            .map(|i| format!("Sentence number {} talks about closures.", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Rebuild the text from ranges, dropping the overlapping prefix of each.
    fn reconstruct(text: &str, ranges: &[Range<usize>]) -> String {
        let mut out = String::new();
        let mut covered = 0;
        for r in ranges {
            assert!(r.start <= covered, "gap before {:?}", r);
            out.push_str(&text[covered.max(r.start)..r.end]);
            covered = r.end;
        }
        out
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        let chunker = Chunker::new(100, 10);
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("   \n\t ").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = Chunker::new(800, 100);
        let text = "One sentence. Two sentences.";
        assert_eq!(chunker.split(text), vec![0..text.len()]);
    }

    #[test]
    fn test_reconstructs_source_text() {
        let chunker = Chunker::new(120, 45);
        let text = sentences(20);
        let ranges = chunker.split(&text);

        assert!(ranges.len() > 1);
        assert_eq!(reconstruct(&text, &ranges), text);
        assert_eq!(ranges.last().map(|r| r.end), Some(text.len()));
    }

    #[test]
    fn test_never_splits_a_sentence() {
        let chunker = Chunker::new(100, 30);
        let text = sentences(12);
        let boundaries: Vec<usize> = text
            .split_sentence_bound_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        for r in chunker.split(&text) {
            assert!(boundaries.contains(&r.start));
            assert!(boundaries.contains(&r.end));
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let chunker = Chunker::new(150, 50);
        let text = sentences(15);
        let ranges = chunker.split(&text);

        for pair in ranges.windows(2) {
            assert!(pair[1].start < pair[0].end, "no overlap: {:?}", pair);
            assert!(pair[1].end > pair[0].end, "no new content: {:?}", pair);
        }
    }

    #[test]
    fn test_overlap_carries_final_sentence_even_if_long() {
        // Each sentence is ~41 chars, larger than the overlap budget.
        let chunker = Chunker::new(100, 10);
        let text = sentences(6);
        let ranges = chunker.split(&text);

        for pair in ranges.windows(2) {
            assert!(pair[1].start < pair[0].end);
        }
    }

    #[test]
    fn test_multi_sentence_chunks_respect_budget() {
        // Sentence lengths in characters, trailing space included
        let lengths = [19, 69, 79, 30, 85, 12, 60, 44, 98, 7];
        let text: String = lengths
            .iter()
            .map(|&n| format!("A{}. ", "a".repeat(n - 3)))
            .collect();
        assert_eq!(text.split_sentence_bounds().count(), lengths.len());

        let chunker = Chunker::new(100, 10);
        let ranges = chunker.split(&text);

        for r in &ranges {
            let slice = &text[r.clone()];
            let chars = slice.chars().count();
            if slice.split_sentence_bounds().count() > 1 {
                assert!(chars <= 100, "chunk {:?} has {} chars", r, chars);
            }
        }
        assert_eq!(reconstruct(&text, &ranges), text);
    }

    #[test]
    fn test_zero_overlap() {
        let chunker = Chunker::new(100, 0);
        let text = sentences(8);
        let ranges = chunker.split(&text);

        for pair in ranges.windows(2) {
            assert_eq!(pair[1].start, pair[0].end);
        }
        assert_eq!(reconstruct(&text, &ranges), text);
    }

    #[test]
    fn test_long_sentence_is_kept_whole() {
        let chunker = Chunker::new(20, 5);
        let long = "This single sentence is far longer than the configured budget.";
        let text = format!("{} Short one.", long);
        let ranges = chunker.split(&text);

        assert_eq!(&text[ranges[0].clone()].trim_end(), &long);
        assert_eq!(reconstruct(&text, &ranges), text);
    }

    #[test]
    fn test_chunk_document_headers_and_indices() {
        let doc = CourseDocument {
            course: Course::new("Intro to Python"),
            blocks: vec![
                LessonText {
                    lesson_number: Some(1),
                    text: sentences(10),
                },
                LessonText {
                    lesson_number: Some(2),
                    text: "Variables hold values.".to_string(),
                },
                LessonText {
                    lesson_number: Some(3),
                    text: String::new(),
                },
            ],
        };

        let chunks = Chunker::new(120, 40).chunk_document(&doc);

        assert!(chunks.len() > 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index as usize, i);
        }
        assert!(chunks[0]
            .content
            .starts_with("Course Intro to Python Lesson 1 content: "));

        let last = chunks.last().unwrap();
        assert_eq!(last.lesson_number, Some(2));
        assert_eq!(last.body(), "Variables hold values.");
        assert!(chunks.iter().all(|c| c.lesson_number != Some(3)));
    }
}
