//! Counting queries over the interaction store

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use agentdesk_session::InteractionStore;

use super::{ToolError, ToolTrait};

const SESSION_WORDS: &[&str] = &["session", "chat", "conversation", "聊天", "对话", "会话"];
const INTERACTION_WORDS: &[&str] = &["interaction", "message", "消息", "记录"];

/// Answers "how many sessions / interactions" questions
pub struct DatabaseTool {
    store: Arc<dyn InteractionStore>,
}

impl DatabaseTool {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }
}

fn mentions(text: &str, words: &[&str]) -> bool {
    words.iter().any(|w| text.contains(w))
}

#[async_trait]
impl ToolTrait for DatabaseTool {
    fn name(&self) -> &str {
        "database_query"
    }

    fn description(&self) -> &str {
        "Query stored data. Input should describe what to count, e.g. chat sessions or messages."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "input": { "type": "string", "description": "What to look up" }
            },
            "required": ["input"]
        })
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        let query = input.to_lowercase();
        let wants_sessions = mentions(&query, SESSION_WORDS);
        let wants_interactions = mentions(&query, INTERACTION_WORDS);

        if !wants_sessions && !wants_interactions {
            return Ok("Please provide a more specific query.".to_string());
        }

        let stats = match self.store.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Database query failed: {}", e);
                return Ok(format!("Database query failed: {}", e));
            }
        };

        Ok(if wants_sessions {
            format!("The database holds {} chat sessions", stats.sessions)
        } else {
            format!("The database holds {} messages", stats.interactions)
        })
    }
}
