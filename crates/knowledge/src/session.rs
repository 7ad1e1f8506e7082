//! Per-session conversation memory.
//!
//! Each session keeps a sliding window of its most recent exchanges, oldest
//! first. Sessions live in memory only.

use crate::types::Exchange;
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

/// Bounded conversation history keyed by session id.
#[derive(Debug)]
pub struct ConversationStore {
    max_history: usize,
    sessions: RwLock<HashMap<String, VecDeque<Exchange>>>,
}

impl ConversationStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            max_history,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new, empty session and return its id.
    pub fn create_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), VecDeque::new());

        tracing::debug!("Created session {}", id);
        id
    }

    /// Exchanges of a session, oldest first. Unknown sessions have none.
    pub fn get_history(&self, session_id: &str) -> Vec<Exchange> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Record a completed exchange, evicting the oldest beyond `max_history`.
    pub fn append(&self, session_id: &str, query: &str, answer: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let history = sessions.entry(session_id.to_string()).or_default();

        history.push_back(Exchange {
            query: query.to_string(),
            answer: answer.to_string(),
        });
        while history.len() > self.max_history {
            history.pop_front();
        }
    }

    /// History rendered for prompt injection, `None` when there is none.
    pub fn format_history(&self, session_id: &str) -> Option<String> {
        let history = self.get_history(session_id);
        if history.is_empty() {
            return None;
        }

        let lines: Vec<String> = history
            .iter()
            .map(|exchange| format!("User: {}\nAssistant: {}", exchange.query, exchange.answer))
            .collect();
        Some(lines.join("\n"))
    }

    pub fn clear_session(&self, session_id: &str) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id);
    }
}
