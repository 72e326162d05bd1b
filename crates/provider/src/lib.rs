//! Reasoning capability for the agent loop
//!
//! The dispatch loop treats the language model as an opaque capability: given
//! the user input, the conversation so far, the available tools and the steps
//! already taken, it either answers or picks one tool to run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use thiserror::Error;

pub mod keyword;
pub mod openai;

pub use keyword::KeywordReasoner;
pub use openai::OpenAiReasoner;

/// Reasoner errors
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("api error: {0}")]
    Api(String),

    #[error("no api key configured")]
    NoApiKey,

    #[error("invalid response from model")]
    InvalidResponse,

    #[error("rate limited")]
    RateLimited,
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A conversation turn handed to the model as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Tool description offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// One tool round-trip inside a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub tool: String,
    pub input: String,
    pub observation: String,
}

impl Step {
    pub fn new(
        tool: impl Into<String>,
        input: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            input: input.into(),
            observation: observation.into(),
        }
    }
}

/// Everything the model sees for one decision
#[derive(Debug, Clone, Default)]
pub struct DecideRequest {
    pub system_prompt: String,
    pub input: String,
    pub context: Vec<Message>,
    pub tools: Vec<ToolSpec>,
    pub transcript: Vec<Step>,
    /// Loop events the model should know about, such as a timed-out call
    pub notes: Vec<String>,
}

impl DecideRequest {
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn last_observation(&self) -> Option<&str> {
        self.transcript.last().map(|s| s.observation.as_str())
    }
}

/// What the model chose to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Answer the user and stop
    Final { answer: String },
    /// Run a tool with the given argument string
    UseTool { tool: String, input: String },
}

impl Decision {
    pub fn final_answer(answer: impl Into<String>) -> Self {
        Decision::Final {
            answer: answer.into(),
        }
    }

    pub fn use_tool(tool: impl Into<String>, input: impl Into<String>) -> Self {
        Decision::UseTool {
            tool: tool.into(),
            input: input.into(),
        }
    }
}

/// External language-model capability
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Produce a final answer or select a tool
    async fn decide(&self, request: DecideRequest) -> Result<Decision>;
    /// Produce a best-effort answer once the iteration budget is spent
    async fn synthesize(&self, request: DecideRequest) -> Result<String>;
    fn default_model(&self) -> String;
    fn is_configured(&self) -> bool;
}

/// Build a JSON schema with string properties
pub fn object_schema(properties: Vec<(String, String, bool)>) -> Value {
    let mut props = serde_json::Map::new();
    let mut required = Vec::new();

    for (name, description, is_required) in properties {
        props.insert(
            name.clone(),
            serde_json::json!({
                "type": "string",
                "description": description
            }),
        );
        if is_required {
            required.push(name);
        }
    }

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required
    })
}
