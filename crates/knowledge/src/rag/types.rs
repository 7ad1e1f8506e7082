//! RAG response types.

use crate::types::Source;
use serde::{Deserialize, Serialize};

/// Response to a course question.
///
/// Carries the synthesized answer, the sources behind it, and the session
/// the exchange was recorded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    /// Natural language answer from the model
    pub answer: String,

    /// Sources from the last content search of this query (may be empty)
    pub sources: Vec<Source>,

    /// Session to pass back for follow-up questions
    pub session_id: String,
}
