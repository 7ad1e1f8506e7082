//! SQLite-backed vector index for the course catalog and content chunks.
//!
//! Embeddings are stored as little-endian f32 blobs and ranked by
//! brute-force cosine similarity.

use crate::types::{Course, CourseChunk};
use crate::vector_index::{cosine_similarity, ContentFilter, VectorIndex};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use syllabus_core::{AppError, AppResult};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS catalog (
        title TEXT PRIMARY KEY,
        summary TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE TABLE IF NOT EXISTS content (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        range_start INTEGER NOT NULL,
        range_end INTEGER NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_content_course ON content(course_title);
"#;

/// Course index stored in a single SQLite database.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) the index database at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// A throwaway index living in memory.
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Knowledge(format!("Failed to open in-memory index: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Index connection lock poisoned".to_string()))
    }
}

impl VectorIndex for SqliteIndex {
    fn replace_course(
        &self,
        course: &Course,
        catalog_embedding: &[f32],
        chunks: &[CourseChunk],
        embeddings: &[Vec<f32>],
    ) -> AppResult<()> {
        if chunks.len() != embeddings.len() {
            return Err(AppError::Knowledge(format!(
                "Got {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let summary = serde_json::to_string(course)?;
        let mut conn = self.lock()?;
        // Rolled back on drop unless committed
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM content WHERE course_title = ?1",
            params![course.title],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to delete chunks: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO content (course_title, lesson_number, chunk_index, content, range_start, range_end, embedding)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )
                .map_err(|e| AppError::Knowledge(format!("Failed to prepare insert: {}", e)))?;

            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                stmt.execute(params![
                    course.title,
                    chunk.lesson_number.map(i64::from),
                    chunk.chunk_index as i64,
                    chunk.content,
                    chunk.byte_range.start as i64,
                    chunk.byte_range.end as i64,
                    embedding_to_bytes(embedding),
                ])
                .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO catalog (title, summary, embedding) VALUES (?1, ?2, ?3)",
            params![course.title, summary, embedding_to_bytes(catalog_embedding)],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to upsert course: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Knowledge(format!("Failed to commit course: {}", e)))?;

        tracing::debug!("Stored '{}' with {} chunks", course.title, chunks.len());
        Ok(())
    }

    fn nearest_courses(&self, embedding: &[f32], limit: usize) -> AppResult<Vec<(Course, f32)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT summary, embedding FROM catalog")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let summary: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((summary, blob))
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query catalog: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (summary, blob) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read catalog: {}", e)))?;
            let course: Course = serde_json::from_str(&summary)?;
            let score = cosine_similarity(embedding, &bytes_to_embedding(&blob)?);
            results.push((course, score));
        }

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.title.cmp(&b.0.title)));
        results.truncate(limit);
        Ok(results)
    }

    fn nearest_chunks(
        &self,
        embedding: &[f32],
        filter: &ContentFilter,
        limit: usize,
    ) -> AppResult<Vec<(CourseChunk, f32)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT course_title, lesson_number, chunk_index, content, range_start, range_end, embedding
                 FROM content
                 WHERE (?1 IS NULL OR course_title = ?1)
                   AND (?2 IS NULL OR lesson_number = ?2)",
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(
                params![filter.course_title, filter.lesson_number.map(i64::from)],
                |row| {
                    let chunk = CourseChunk {
                        course_title: row.get(0)?,
                        lesson_number: row.get::<_, Option<i64>>(1)?.map(|n| n as u32),
                        chunk_index: row.get::<_, i64>(2)? as u32,
                        content: row.get(3)?,
                        byte_range: row.get::<_, i64>(4)? as usize..row.get::<_, i64>(5)? as usize,
                    };
                    let blob: Vec<u8> = row.get(6)?;
                    Ok((chunk, blob))
                },
            )
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

        let mut results = Vec::new();
        for row in rows {
            let (chunk, blob) =
                row.map_err(|e| AppError::Knowledge(format!("Failed to read chunk: {}", e)))?;
            let score = cosine_similarity(embedding, &bytes_to_embedding(&blob)?);
            results.push((chunk, score));
        }

        // Ties keep document order
        results.sort_by(|a, b| {
            b.1.total_cmp(&a.1)
                .then_with(|| a.0.course_title.cmp(&b.0.course_title))
                .then_with(|| a.0.chunk_index.cmp(&b.0.chunk_index))
        });
        results.truncate(limit);

        tracing::debug!(
            "Retrieved {} chunks (requested top-{}, filter: {:?})",
            results.len(),
            limit,
            filter
        );

        Ok(results)
    }

    fn course_titles(&self) -> AppResult<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT title FROM catalog ORDER BY title")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let titles = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| AppError::Knowledge(format!("Failed to list courses: {}", e)))?;

        Ok(titles)
    }

    fn course_summary(&self, title: &str) -> AppResult<Option<Course>> {
        let conn = self.lock()?;
        let summary: Option<String> = conn
            .query_row(
                "SELECT summary FROM catalog WHERE title = ?1",
                params![title],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| AppError::Knowledge(format!("Failed to load course: {}", e)))?;

        summary
            .map(|s| serde_json::from_str(&s).map_err(AppError::from))
            .transpose()
    }

    fn course_count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| AppError::Knowledge(format!("Failed to count courses: {}", e)))
    }

    fn chunk_count(&self) -> AppResult<usize> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM content", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| AppError::Knowledge(format!("Failed to count chunks: {}", e)))
    }

    fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM content; DELETE FROM catalog;")
            .map_err(|e| AppError::Knowledge(format!("Failed to reset index: {}", e)))?;

        tracing::info!("Reset course index");
        Ok(())
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Lesson;
    use tempfile::TempDir;

    fn course(title: &str) -> Course {
        Course {
            title: title.to_string(),
            link: Some(format!("https://example.com/{}", title.len())),
            instructor: None,
            lessons: vec![Lesson {
                number: 1,
                title: "Basics".to_string(),
                link: None,
            }],
        }
    }

    fn chunk(title: &str, lesson: Option<u32>, index: u32) -> CourseChunk {
        CourseChunk {
            course_title: title.to_string(),
            lesson_number: lesson,
            chunk_index: index,
            content: format!("{} body {}", CourseChunk::header(title, lesson), index),
            byte_range: 0..10,
        }
    }

    #[test]
    fn test_open_creates_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".syllabus").join("index.sqlite");
        let index = SqliteIndex::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(index.course_count().unwrap(), 0);
    }

    #[test]
    fn test_catalog_upsert_is_idempotent() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .replace_course(&course("Intro to Python"), &[1.0, 0.0], &[], &[])
            .unwrap();
        index
            .replace_course(&course("Intro to Python"), &[1.0, 0.0], &[], &[])
            .unwrap();

        assert_eq!(index.course_count().unwrap(), 1);
        let loaded = index.course_summary("Intro to Python").unwrap().unwrap();
        assert_eq!(loaded, course("Intro to Python"));
        assert!(index.course_summary("Missing").unwrap().is_none());
    }

    #[test]
    fn test_nearest_courses_ranking() {
        let index = SqliteIndex::in_memory().unwrap();
        index.replace_course(&course("A"), &[1.0, 0.0], &[], &[]).unwrap();
        index.replace_course(&course("B"), &[0.0, 1.0], &[], &[]).unwrap();

        let nearest = index.nearest_courses(&[0.1, 0.9], 1).unwrap();
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0].0.title, "B");
    }

    #[test]
    fn test_replace_course_replaces_previous_chunks() {
        let index = SqliteIndex::in_memory().unwrap();
        let first = vec![chunk("A", Some(1), 0), chunk("A", Some(1), 1)];
        index
            .replace_course(&course("A"), &[1.0], &first, &[vec![1.0, 0.0], vec![0.5, 0.5]])
            .unwrap();
        index
            .replace_course(&course("A"), &[1.0], &[chunk("A", Some(2), 0)], &[vec![1.0, 0.0]])
            .unwrap();

        assert_eq!(index.chunk_count().unwrap(), 1);
        assert_eq!(index.course_count().unwrap(), 1);
    }

    #[test]
    fn test_replace_course_rejects_mismatched_embeddings() {
        let index = SqliteIndex::in_memory().unwrap();
        let result = index.replace_course(&course("A"), &[1.0], &[chunk("A", None, 0)], &[]);
        assert!(matches!(result, Err(AppError::Knowledge(_))));
        assert!(index.course_titles().unwrap().is_empty());
    }

    #[test]
    fn test_failed_chunk_write_leaves_no_catalog_entry() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .replace_course(&course("A"), &[1.0], &[chunk("A", None, 0)], &[vec![1.0, 0.0]])
            .unwrap();

        index
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_chunks BEFORE INSERT ON content
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
            )
            .unwrap();

        let result = index.replace_course(
            &course("B"),
            &[0.0, 1.0],
            &[chunk("B", None, 0)],
            &[vec![0.0, 1.0]],
        );
        assert!(matches!(result, Err(AppError::Knowledge(_))));

        // The new course is absent and the old one is untouched
        assert_eq!(index.course_titles().unwrap(), vec!["A"]);
        assert_eq!(index.chunk_count().unwrap(), 1);

        let result = index.replace_course(
            &course("A"),
            &[1.0],
            &[chunk("A", None, 0)],
            &[vec![1.0, 0.0]],
        );
        assert!(result.is_err());
        assert_eq!(index.chunk_count().unwrap(), 1);
    }

    #[test]
    fn test_nearest_chunks_filters() {
        let index = SqliteIndex::in_memory().unwrap();
        index
            .replace_course(
                &course("A"),
                &[1.0],
                &[chunk("A", Some(1), 0), chunk("A", Some(2), 1)],
                &[vec![1.0, 0.0], vec![1.0, 0.1]],
            )
            .unwrap();
        index
            .replace_course(&course("B"), &[1.0], &[chunk("B", None, 0)], &[vec![1.0, 0.0]])
            .unwrap();

        let all = index
            .nearest_chunks(&[1.0, 0.0], &ContentFilter::default(), 10)
            .unwrap();
        assert_eq!(all.len(), 3);
        // Equal scores fall back to title then position
        assert_eq!(all[0].0.course_title, "A");
        assert_eq!(all[1].0.course_title, "B");

        let only_a = ContentFilter {
            course_title: Some("A".to_string()),
            lesson_number: None,
        };
        let hits = index.nearest_chunks(&[1.0, 0.0], &only_a, 10).unwrap();
        assert!(hits.iter().all(|(c, _)| c.course_title == "A"));

        let lesson_two = ContentFilter {
            course_title: Some("A".to_string()),
            lesson_number: Some(2),
        };
        let hits = index.nearest_chunks(&[1.0, 0.0], &lesson_two, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.lesson_number, Some(2));
        assert_eq!(hits[0].0.byte_range, 0..10);
    }

    #[test]
    fn test_reset_and_titles() {
        let index = SqliteIndex::in_memory().unwrap();
        index.replace_course(&course("Zeta"), &[1.0], &[], &[]).unwrap();
        index.replace_course(&course("Alpha"), &[1.0], &[], &[]).unwrap();
        assert_eq!(index.course_titles().unwrap(), vec!["Alpha", "Zeta"]);

        index.reset().unwrap();
        assert_eq!(index.course_count().unwrap(), 0);
        assert!(index.course_titles().unwrap().is_empty());
    }

    #[test]
    fn test_embedding_bytes() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)).unwrap(), v);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }
}
