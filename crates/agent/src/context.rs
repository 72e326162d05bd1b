//! Prompt assembly for reasoner requests

use chrono::Local;

use agentdesk_provider::{DecideRequest, Message, Step};

use crate::tools::ToolRegistry;

/// Builds the system prompt and the per-iteration `DecideRequest`
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    persona: Option<String>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra instructions appended after the identity block
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    /// Build the system prompt
    pub fn build_system_prompt(&self, registry: &ToolRegistry) -> String {
        let mut parts = vec![self.identity(), Self::tool_section(registry)];
        if let Some(persona) = self.persona.as_deref().filter(|p| !p.trim().is_empty()) {
            parts.push(format!("## Persona\n\n{}", persona.trim()));
        }
        parts.join("\n\n")
    }

    fn identity(&self) -> String {
        let now = Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            r#"# agentdesk

You are agentdesk, a helpful assistant that answers questions and can call tools.

## Current Time
{}

Use a tool only when it helps answer the question. Each tool takes a single text input.
When you have enough information, reply directly with the final answer."#,
            now
        )
    }

    fn tool_section(registry: &ToolRegistry) -> String {
        if registry.is_empty() {
            return "## Tools\n\nNo tools are available; answer directly.".to_string();
        }
        let lines: Vec<String> = registry
            .list()
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect();
        format!("## Tools\n\n{}", lines.join("\n"))
    }

    /// Request for one reasoning iteration
    pub fn build_request(
        &self,
        input: &str,
        context: &[Message],
        registry: &ToolRegistry,
        transcript: &[Step],
        notes: &[String],
    ) -> DecideRequest {
        DecideRequest {
            system_prompt: self.build_system_prompt(registry),
            input: input.to_string(),
            context: context.to_vec(),
            tools: registry.definitions(),
            transcript: transcript.to_vec(),
            notes: notes.to_vec(),
        }
    }
}
