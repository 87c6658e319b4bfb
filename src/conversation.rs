//! Per-session conversation transcripts
//!
//! A [`Conversation`] is the ordered list of turns sent to the model on every
//! call. The [`SessionStore`] hands out one conversation per session id, each
//! behind its own async mutex so a session's turns never interleave.

use crate::llm::LlmMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Ordered transcript of user, assistant and tool-result turns
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<LlmMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: LlmMessage) {
        self.messages.push(message);
    }

    pub fn snapshot(&self) -> &[LlmMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything except the last `n` messages
    pub fn truncate_keep_last(&mut self, n: usize) {
        if self.messages.len() > n {
            let excess = self.messages.len() - n;
            self.messages.drain(..excess);
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The part of the transcript that can be replayed to the model.
    ///
    /// Starts at the first plain user message, so a truncation that split a
    /// tool-use/tool-result pair never leaks an orphaned result.
    pub fn replay_window(&self) -> &[LlmMessage] {
        let start = self
            .messages
            .iter()
            .position(LlmMessage::is_user_text)
            .unwrap_or(self.messages.len());
        &self.messages[start..]
    }
}

/// Shared handle to one session's conversation
pub type SessionHandle = Arc<Mutex<Conversation>>;

/// In-memory conversations keyed by session id
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session's conversation, creating an empty one on first use
    pub async fn session(&self, id: &str) -> SessionHandle {
        if let Some(handle) = self.get(id).await {
            return handle;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "Created session");
                Arc::new(Mutex::new(Conversation::new()))
            })
            .clone()
    }

    /// Look up an existing session without creating one
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Drop a session; returns whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
