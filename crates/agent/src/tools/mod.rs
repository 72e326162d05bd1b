//! Tool registry and built-in tools

pub mod calculator;
pub mod database;
pub mod task_manager;
pub mod weather;

pub use calculator::CalculatorTool;
pub use database::DatabaseTool;
pub use task_manager::TaskManagerTool;
pub use weather::WeatherTool;

use async_trait::async_trait;
use agentdesk_provider::{object_schema, ToolSpec};
use agentdesk_session::InteractionStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{AgentError, Result};

/// Error a tool may leak past its own boundary
pub type ToolError = Box<dyn std::error::Error + Send + Sync>;

/// A named string-to-string capability.
///
/// Tools should report their own failures as descriptive text; an `Err`
/// reaching the dispatch loop is turned into an observation anyway.
#[async_trait]
pub trait ToolTrait: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    fn parameters(&self) -> Value {
        object_schema(vec![("input".to_string(), "Tool input".to_string(), true)])
    }

    async fn invoke(&self, input: &str) -> std::result::Result<String, ToolError>;
}

pub fn to_tool_spec(tool: &dyn ToolTrait) -> ToolSpec {
    ToolSpec::new(tool.name(), tool.description(), tool.parameters())
}

/// Name-unique tool set, listed in registration order
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolTrait>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ToolTrait + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_arc(Arc::new(tool))
    }

    pub fn register_arc(&mut self, tool: Arc<dyn ToolTrait>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn ToolTrait>> {
        self.index
            .get(name)
            .map(|&i| self.tools[i].clone())
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn list(&self) -> Vec<Arc<dyn ToolTrait>> {
        self.tools.clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// Name, description and parameter schema of every tool
    pub fn definitions(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| to_tool_spec(t.as_ref())).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Copy holding only the named tools; unknown names are ignored
    pub fn restricted_to(&self, names: &[String]) -> ToolRegistry {
        let mut restricted = ToolRegistry::new();
        for tool in &self.tools {
            if names.iter().any(|n| n == tool.name()) {
                // names are unique in self
                let _ = restricted.register_arc(tool.clone());
            }
        }
        restricted
    }

    pub async fn execute(&self, name: &str, input: &str) -> Result<String> {
        let tool = self.get(name)?;
        tool.invoke(input)
            .await
            .map_err(|e| AgentError::ToolExecution(e.to_string()))
    }
}

/// Calculator, weather and database tools
pub fn default_registry(store: Arc<dyn InteractionStore>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    // fresh registry, names are distinct
    let _ = registry.register(WeatherTool::new());
    let _ = registry.register(DatabaseTool::new(store));
    let _ = registry.register(CalculatorTool::new());
    registry
}
