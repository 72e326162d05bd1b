//! Agent execution core
//!
//! Cache-first tool-dispatch loop over an external reasoner, with durable
//! interaction history and a planning specialization.

use thiserror::Error;

use agentdesk_provider::ProviderError;
use agentdesk_session::SessionError;

pub mod context;
pub mod envelope;
pub mod loop_agent;
pub mod planning;
pub mod tools;

pub use context::ContextBuilder;
pub use envelope::ResultEnvelope;
pub use loop_agent::{AgentCore, AgentSettings};
pub use planning::PlanningCore;
pub use tools::{ToolRegistry, ToolTrait};

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Unknown tool '{0}'")]
    UnknownTool(String),

    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    #[error("Model error: {0}")]
    Model(#[from] ProviderError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, AgentError>;
