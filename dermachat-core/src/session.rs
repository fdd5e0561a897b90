//! In-memory conversation history, bounded per session.
//!
//! One exchange per chat turn; the window is trimmed FIFO so a session never
//! holds more than `history_limit` exchanges. Append+trim runs under the map
//! mutex, so concurrent turns on the same session cannot lose updates.
//! Nothing is persisted — history dies with the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// One (user, assistant) turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded in-memory session history store.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Vec<Exchange>>>,
    history_limit: usize,
}

impl SessionStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            history_limit,
        }
    }

    /// Append one exchange, creating the session lazily and evicting the
    /// oldest entries beyond the limit.
    pub async fn append(&self, session_id: &str, user: String, assistant: String) {
        let mut sessions = self.sessions.lock().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(Exchange {
            user,
            assistant,
            timestamp: Utc::now(),
        });
        if history.len() > self.history_limit {
            let excess = history.len() - self.history_limit;
            history.drain(..excess);
        }
    }

    /// Full history for a session (empty when unknown).
    pub async fn history(&self, session_id: &str) -> Vec<Exchange> {
        let sessions = self.sessions.lock().await;
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Most recent `n` exchanges, oldest first.
    pub async fn recent(&self, session_id: &str, n: usize) -> Vec<Exchange> {
        let sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some(history) => {
                let skip = history.len().saturating_sub(n);
                history[skip..].to_vec()
            }
            None => Vec::new(),
        }
    }

    /// Drop a session's history entirely.
    pub async fn clear(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
    }
}
