//! Interaction history and conversation memory
//!
//! `InteractionStore` is the durable, append-only log of what each session
//! asked and what the agent answered. `ConversationMemory` is the
//! in-process buffer replayed to the model as context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod conversation;
pub mod jsonl;
pub mod memory;

pub use conversation::ConversationMemory;
pub use jsonl::JsonlInteractionStore;
pub use memory::MemoryInteractionStore;

/// Store errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// One request/response pair of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub session_id: String,
    pub user_input: String,
    pub agent_response: String,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// New interaction stamped with the current time
    pub fn new(
        session_id: impl Into<String>,
        user_input: impl Into<String>,
        agent_response: impl Into<String>,
    ) -> Self {
        Self::at(session_id, user_input, agent_response, Utc::now())
    }

    pub fn at(
        session_id: impl Into<String>,
        user_input: impl Into<String>,
        agent_response: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            user_input: user_input.into(),
            agent_response: agent_response.into(),
            created_at,
        }
    }
}

/// Aggregate counts over the whole store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub sessions: usize,
    pub interactions: usize,
}

/// Durable append-only interaction log
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Persist one interaction; returns only once the write is durable
    async fn append(&self, interaction: &Interaction) -> Result<()>;
    /// Interactions of a session, oldest first; empty for unknown sessions
    async fn history(&self, session_id: &str) -> Result<Vec<Interaction>>;
    async fn stats(&self) -> Result<StoreStats>;
}

/// Stable sort by creation time, keeping append order for equal stamps
pub(crate) fn sort_chronologically(interactions: &mut [Interaction]) {
    interactions.sort_by_key(|i| i.created_at);
}
