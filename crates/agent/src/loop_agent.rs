//! Agent loop - cache-first tool dispatch

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use agentdesk_cache::{fingerprint_with_tools, ResultCache};
use agentdesk_config::{Config, EarlyStopping};
use agentdesk_provider::{Decision, Message, Reasoner, Step};
use agentdesk_session::{ConversationMemory, Interaction, InteractionStore};

use crate::context::ContextBuilder;
use crate::envelope::ResultEnvelope;
use crate::tools::{self, ToolRegistry, ToolTrait};
use crate::{AgentError, Result};

const STOPPED_MESSAGE: &str = "Agent stopped after reaching the iteration limit.";

/// Loop parameters
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub max_iterations: u32,
    pub early_stopping: EarlyStopping,
    pub model_timeout: Duration,
    pub tool_timeout: Duration,
    pub cache_ttl: Duration,
    pub record_failures: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            early_stopping: EarlyStopping::Generate,
            model_timeout: Duration::from_secs(30),
            tool_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(1800),
            record_failures: true,
        }
    }
}

impl From<&Config> for AgentSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_iterations: config.agent.max_iterations,
            early_stopping: config.agent.early_stopping,
            model_timeout: config.model_timeout(),
            tool_timeout: config.tool_timeout(),
            cache_ttl: config.agent_ttl(),
            record_failures: config.agent.record_failures,
        }
    }
}

/// Answer and tool trail of one dispatch loop
struct Outcome {
    answer: String,
    tools_used: Vec<String>,
}

/// Runs requests against a reasoner and a tool registry, memoizing
/// envelopes and recording every answered interaction
pub struct AgentCore {
    reasoner: Arc<dyn Reasoner>,
    tools: RwLock<Arc<ToolRegistry>>,
    cache: ResultCache,
    store: Arc<dyn InteractionStore>,
    memory: ConversationMemory,
    context: ContextBuilder,
    settings: AgentSettings,
}

impl AgentCore {
    /// Core with the default tools, an in-memory cache and default settings
    pub fn new(reasoner: Arc<dyn Reasoner>, store: Arc<dyn InteractionStore>) -> Self {
        let registry = tools::default_registry(store.clone());
        Self {
            reasoner,
            tools: RwLock::new(Arc::new(registry)),
            cache: ResultCache::in_memory(),
            store,
            memory: ConversationMemory::new(),
            context: ContextBuilder::new(),
            settings: AgentSettings::default(),
        }
    }

    /// Core configured from the `agent` and `cache` sections
    pub fn from_config(
        config: &Config,
        reasoner: Arc<dyn Reasoner>,
        store: Arc<dyn InteractionStore>,
    ) -> Self {
        Self::new(reasoner, store).with_settings(AgentSettings::from(config))
    }

    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_settings(mut self, settings: AgentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the registry wholesale
    pub fn with_tools(mut self, registry: ToolRegistry) -> Self {
        self.tools = RwLock::new(Arc::new(registry));
        self
    }

    pub fn with_context(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Current registry snapshot
    pub async fn tools(&self) -> Arc<ToolRegistry> {
        self.tools.read().await.clone()
    }

    /// Register a tool for subsequent runs.
    ///
    /// Runs already in flight keep the registry they started with.
    pub async fn add_tool<T: ToolTrait + 'static>(&self, tool: T) -> Result<()> {
        self.add_tool_arc(Arc::new(tool)).await
    }

    pub async fn add_tool_arc(&self, tool: Arc<dyn ToolTrait>) -> Result<()> {
        let mut current = self.tools.write().await;
        let mut next = ToolRegistry::clone(&current);
        next.register_arc(tool)?;
        *current = Arc::new(next);
        Ok(())
    }

    /// Stored interactions of a session, oldest first
    pub async fn history(&self, session_id: &str) -> Result<Vec<Interaction>> {
        Ok(self.store.history(session_id).await?)
    }

    /// Answer `user_input` within `session_id`
    pub async fn run(&self, user_input: &str, session_id: &str) -> ResultEnvelope {
        self.run_with_tools(user_input, session_id, None).await
    }

    /// Answer `user_input`, offering the reasoner only the named tools when
    /// a filter is given
    pub async fn run_with_tools(
        &self,
        user_input: &str,
        session_id: &str,
        tool_filter: Option<&[String]>,
    ) -> ResultEnvelope {
        let cache_key = fingerprint_with_tools(session_id, user_input, tool_filter);

        if let Some(cached) = self.cache.get::<ResultEnvelope>(&cache_key).await {
            debug!("Cache hit for session {}", session_id);
            return cached;
        }
        debug!("Cache miss for session {}", session_id);
        info!("Running agent for session {}", session_id);

        let registry = match tool_filter {
            Some(names) => Arc::new(self.tools().await.restricted_to(names)),
            None => self.tools().await,
        };
        let context = self.memory.history(session_id).await;

        match self.dispatch(user_input, &context, &registry).await {
            Ok(outcome) => self.finish(user_input, session_id, outcome, &cache_key).await,
            Err(e) => self.fail(user_input, session_id, e).await,
        }
    }

    /// Bounded decide/invoke loop
    async fn dispatch(
        &self,
        input: &str,
        context: &[Message],
        registry: &ToolRegistry,
    ) -> Result<Outcome> {
        let mut transcript: Vec<Step> = Vec::new();
        let mut tools_used = Vec::new();
        let mut notes: Vec<String> = Vec::new();

        for iteration in 1..=self.settings.max_iterations {
            debug!("Agent iteration {}", iteration);

            let request = self
                .context
                .build_request(input, context, registry, &transcript, &notes);

            let decision = match timeout(self.settings.model_timeout, self.reasoner.decide(request)).await {
                Ok(decision) => decision?,
                Err(_) => {
                    let message = format!(
                        "Model call timed out after {}s",
                        self.settings.model_timeout.as_secs_f32()
                    );
                    warn!("{} (iteration {})", message, iteration);
                    notes.push(message);
                    continue;
                }
            };

            match decision {
                Decision::Final { answer } => {
                    return Ok(Outcome { answer, tools_used });
                }
                Decision::UseTool { tool, input: tool_input } => {
                    let observation = self
                        .invoke_tool(registry, &tool, &tool_input, &mut tools_used)
                        .await;
                    debug!("Tool {} observed: {}", tool, observation);
                    transcript.push(Step::new(tool, tool_input, observation));
                }
            }
        }

        let answer = self
            .early_stop(input, context, registry, &transcript, &notes)
            .await;
        Ok(Outcome { answer, tools_used })
    }

    /// Every failure becomes observation text for the next iteration
    async fn invoke_tool(
        &self,
        registry: &ToolRegistry,
        name: &str,
        input: &str,
        tools_used: &mut Vec<String>,
    ) -> String {
        let tool = match registry.get(name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!("Model selected {}", e);
                return format!("{}. Available tools: {}", e, registry.names().join(", "));
            }
        };

        tools_used.push(name.to_string());
        match timeout(self.settings.tool_timeout, tool.invoke(input)).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                let e = AgentError::ToolExecution(e.to_string());
                warn!("Tool {}: {}", name, e);
                e.to_string()
            }
            Err(_) => {
                warn!("Tool {} timed out", name);
                format!(
                    "Tool '{}' timed out after {}s",
                    name,
                    self.settings.tool_timeout.as_secs_f32()
                )
            }
        }
    }

    /// Best answer once the iteration budget is spent
    async fn early_stop(
        &self,
        input: &str,
        context: &[Message],
        registry: &ToolRegistry,
        transcript: &[Step],
        notes: &[String],
    ) -> String {
        info!(
            "Iteration budget of {} spent, stopping early",
            self.settings.max_iterations
        );

        if self.settings.early_stopping == EarlyStopping::Generate {
            let request = self
                .context
                .build_request(input, context, registry, transcript, notes);
            match timeout(self.settings.model_timeout, self.reasoner.synthesize(request)).await {
                Ok(Ok(answer)) if !answer.trim().is_empty() => return answer,
                Ok(Ok(_)) => warn!("Model produced an empty final answer"),
                Ok(Err(e)) => warn!("Final answer generation failed: {}", e),
                Err(_) => warn!("Final answer generation timed out"),
            }
        }

        transcript
            .last()
            .map(|step| step.observation.clone())
            .or_else(|| notes.last().cloned())
            .unwrap_or_else(|| STOPPED_MESSAGE.to_string())
    }

    async fn finish(
        &self,
        user_input: &str,
        session_id: &str,
        outcome: Outcome,
        cache_key: &str,
    ) -> ResultEnvelope {
        let mut envelope = ResultEnvelope::success(outcome.answer, session_id, outcome.tools_used);

        let interaction = Interaction::at(
            session_id,
            user_input,
            &envelope.response,
            envelope.timestamp,
        );
        if let Err(e) = self.store.append(&interaction).await {
            let e = AgentError::from(e);
            warn!("Failed to record interaction for {}: {}", session_id, e);
            envelope.error = Some(e.to_string());
        }

        self.memory
            .record_turn(session_id, user_input, &envelope.response)
            .await;

        if !envelope.is_error() {
            self.cache
                .put(cache_key, &envelope, self.settings.cache_ttl)
                .await;
        }

        info!(
            "Session {} answered using {} tool call(s)",
            session_id,
            envelope.tools_used.len()
        );
        envelope
    }

    async fn fail(&self, user_input: &str, session_id: &str, e: AgentError) -> ResultEnvelope {
        error!("Agent run failed for session {}: {}", session_id, e);
        let envelope = ResultEnvelope::failure(session_id, e.to_string());

        if self.settings.record_failures {
            let interaction = Interaction::at(
                session_id,
                user_input,
                format!("Error: {}", e),
                envelope.timestamp,
            );
            if let Err(save_err) = self.store.append(&interaction).await {
                warn!("Failed to record failed run for {}: {}", session_id, save_err);
            }
        }

        envelope
    }
}
