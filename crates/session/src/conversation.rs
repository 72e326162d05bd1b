//! Session-scoped conversation buffer

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use agentdesk_provider::Message;

type Buffer = Arc<Mutex<Vec<Message>>>;

/// Per-session message buffers handed to the model as context.
///
/// Appends within one session are serialized by that session's lock;
/// different sessions never wait on each other beyond the brief map lookup.
/// Buffers only grow.
#[derive(Debug, Default)]
pub struct ConversationMemory {
    sessions: Mutex<HashMap<String, Buffer>>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    async fn buffer(&self, session_id: &str) -> Buffer {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }

    /// Messages recorded for a session, oldest first
    pub async fn history(&self, session_id: &str) -> Vec<Message> {
        let buffer = self.sessions.lock().await.get(session_id).cloned();
        match buffer {
            Some(buffer) => buffer.lock().await.clone(),
            None => Vec::new(),
        }
    }

    /// Append a user message and the assistant reply as one unit
    pub async fn record_turn(
        &self,
        session_id: &str,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) {
        let buffer = self.buffer(session_id).await;
        let mut messages = buffer.lock().await;
        messages.push(Message::user(user));
        messages.push(Message::assistant(assistant));
        debug!("Session {} memory at {} messages", session_id, messages.len());
    }

    /// Number of messages held for a session
    pub async fn len(&self, session_id: &str) -> usize {
        self.history(session_id).await.len()
    }

    pub async fn sessions(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sessions.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}
