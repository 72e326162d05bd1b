//! Goal decomposition on top of `AgentCore`

use std::sync::Arc;
use tracing::info;

use agentdesk_cache::derive_key;

use crate::envelope::ResultEnvelope;
use crate::loop_agent::AgentCore;
use crate::tools::TaskManagerTool;
use crate::Result;

/// Turns a goal into a structured plan.
///
/// Every goal gets its own deterministic session, so asking for the same
/// goal twice within the cache TTL returns the first plan.
pub struct PlanningCore {
    core: Arc<AgentCore>,
}

impl PlanningCore {
    /// Wrap a core, registering `task_manager` on it if missing
    pub async fn new(core: Arc<AgentCore>) -> Result<Self> {
        if !core.tools().await.has("task_manager") {
            core.add_tool(TaskManagerTool::new()).await?;
        }
        Ok(Self { core })
    }

    pub fn core(&self) -> &Arc<AgentCore> {
        &self.core
    }

    /// Session used for a goal
    pub fn session_id_for(goal: &str) -> String {
        derive_key("task_planning", goal)
    }

    pub fn prompt_for(goal: &str) -> String {
        format!(
            "Create a detailed plan for the following goal:\n\
             {}\n\n\
             Break it into concrete subtasks. For each subtask give:\n\
             1. Priority (high, medium or low)\n\
             2. Estimated time\n\
             3. Required resources\n\
             4. Dependencies on other subtasks\n\n\
             Answer with a structured, numbered plan.",
            goal.trim()
        )
    }

    pub async fn create_plan(&self, goal: &str) -> ResultEnvelope {
        let session_id = Self::session_id_for(goal);
        info!("Planning goal in session {}", session_id);
        self.core.run(&Self::prompt_for(goal), &session_id).await
    }
}
