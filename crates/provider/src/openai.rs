//! OpenAI-compatible chat completions reasoner
//!
//! Each tool is exposed as a function taking a single `input` string; a tool
//! call in the reply becomes `Decision::UseTool`, plain content becomes
//! `Decision::Final`. Prior steps are replayed as assistant tool calls
//! followed by tool results.

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const SYNTHESIZE_PROMPT: &str = "You have used all available tool calls. \
Using only the observations above, give your best final answer to the user now.";

/// Reasoner backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct OpenAiReasoner {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiReasoner {
    pub fn new(api_key: impl Into<String>, api_base: Option<String>, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: api_base
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    /// Override sampling parameters
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    fn build_messages(&self, request: &DecideRequest) -> Vec<Value> {
        let mut messages = Vec::with_capacity(
            request.context.len() + request.transcript.len() * 2 + request.notes.len() + 2,
        );

        if !request.system_prompt.is_empty() {
            messages.push(json!({"role": "system", "content": request.system_prompt}));
        }
        for m in &request.context {
            messages.push(json!({"role": m.role, "content": m.content}));
        }
        messages.push(json!({"role": "user", "content": request.input}));

        for (i, step) in request.transcript.iter().enumerate() {
            let call_id = format!("call_{}", i);
            messages.push(json!({
                "role": "assistant",
                "content": Value::Null,
                "tool_calls": [{
                    "id": call_id,
                    "type": "function",
                    "function": {
                        "name": step.tool,
                        "arguments": json!({"input": step.input}).to_string()
                    }
                }]
            }));
            messages.push(json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": step.tool,
                "content": step.observation
            }));
        }
        for note in &request.notes {
            messages.push(json!({"role": "system", "content": note}));
        }

        messages
    }

    fn build_request(&self, request: &DecideRequest, with_tools: bool) -> Value {
        let mut messages = self.build_messages(request);
        if !with_tools {
            messages.push(json!({"role": "user", "content": SYNTHESIZE_PROMPT}));
        }

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        if with_tools && !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters
                        }
                    })
                })
                .collect();
            body["tools"] = json!(tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    fn parse_decision(json: &Value) -> Result<Decision> {
        let message = &json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?["message"];

        if let Some(call) = message["tool_calls"].as_array().and_then(|c| c.first()) {
            let function = &call["function"];
            let name = function["name"]
                .as_str()
                .ok_or(ProviderError::InvalidResponse)?
                .to_string();
            let input = tool_input(&function["arguments"]);
            return Ok(Decision::UseTool { tool: name, input });
        }

        let answer = message["content"]
            .as_str()
            .ok_or(ProviderError::InvalidResponse)?;
        Ok(Decision::final_answer(answer.trim()))
    }

    async fn post(&self, body: Value) -> Result<Value> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/chat/completions", self.api_base);
        trace!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let json: Value = response.json().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let error = json["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            return Err(ProviderError::Api(error));
        }

        Ok(json)
    }
}

/// Arguments arrive as a JSON-encoded string; accept `{"input": ..}`, any
/// other object (first string field), or a bare string.
fn tool_input(arguments: &Value) -> String {
    let parsed = match arguments {
        Value::String(raw) => serde_json::from_str::<Value>(raw).unwrap_or_else(|_| arguments.clone()),
        other => other.clone(),
    };

    match &parsed {
        Value::Object(map) => map
            .get("input")
            .and_then(Value::as_str)
            .or_else(|| map.values().find_map(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    async fn decide(&self, request: DecideRequest) -> Result<Decision> {
        let body = self.build_request(&request, true);
        let json = self.post(body).await?;
        let decision = Self::parse_decision(&json)?;
        debug!("Model decision: {:?}", decision);
        Ok(decision)
    }

    async fn synthesize(&self, request: DecideRequest) -> Result<String> {
        let body = self.build_request(&request, false);
        let json = self.post(body).await?;
        match Self::parse_decision(&json)? {
            Decision::Final { answer } => Ok(answer),
            Decision::UseTool { .. } => Err(ProviderError::InvalidResponse),
        }
    }

    fn default_model(&self) -> String {
        self.model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
