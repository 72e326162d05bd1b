//! Offline keyword reasoner
//!
//! Picks tools from keywords in the input and answers with the last tool
//! observation. Lets the CLI run without a model endpoint.

use async_trait::async_trait;

use crate::{DecideRequest, Decision, Reasoner, Result};

const EXPRESSION_CHARS: &str = "0123456789+-*/(). ";

const WEATHER_KEYWORDS: &[&str] = &["weather", "天气", "temperature"];
const COUNT_KEYWORDS: &[&str] = &["how many", "count", "多少", "数据库"];
const GREETING_KEYWORDS: &[&str] = &["hello", "hi ", "你好"];
const HELP_KEYWORDS: &[&str] = &["help", "帮助", "what can you do", "tools"];

#[derive(Debug, Default, Clone)]
pub struct KeywordReasoner;

impl KeywordReasoner {
    pub fn new() -> Self {
        Self
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

/// Longest run of arithmetic characters holding a digit and an operator
pub fn extract_expression(input: &str) -> Option<String> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, c) in input.char_indices() {
        if EXPRESSION_CHARS.contains(c) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            runs.push(&input[s..i]);
        }
    }
    if let Some(s) = start {
        runs.push(&input[s..]);
    }

    runs.into_iter()
        .map(str::trim)
        .filter(|run| {
            run.chars().any(|c| c.is_ascii_digit()) && run.chars().any(|c| "+-*/".contains(c))
        })
        .max_by_key(|run| run.len())
        .map(|run| run.trim_end_matches('.').trim().to_string())
}

/// City named after "in"/"for", or the input without weather words
fn extract_city(input: &str) -> String {
    for marker in [" in ", " for "] {
        if let Some(pos) = input.rfind(marker) {
            let city = input[pos + marker.len()..]
                .trim()
                .trim_end_matches(['?', '.', '!', '？', '。']);
            if !city.is_empty() {
                return city.to_string();
            }
        }
    }

    let mut city = input.to_string();
    for word in ["的天气", "天气", "查一下", "帮我"] {
        city = city.replace(word, "");
    }
    city.trim().to_string()
}

#[async_trait]
impl Reasoner for KeywordReasoner {
    async fn decide(&self, request: DecideRequest) -> Result<Decision> {
        if let Some(observation) = request.last_observation() {
            return Ok(Decision::final_answer(observation));
        }

        let input = request.input.as_str();

        if request.has_tool("calculator") {
            if let Some(expr) = extract_expression(input) {
                return Ok(Decision::use_tool("calculator", expr));
            }
        }
        if request.has_tool("weather_search") && contains_any(input, WEATHER_KEYWORDS) {
            return Ok(Decision::use_tool("weather_search", extract_city(input)));
        }
        if request.has_tool("database_query") && contains_any(input, COUNT_KEYWORDS) {
            return Ok(Decision::use_tool("database_query", input));
        }

        if contains_any(input, HELP_KEYWORDS) {
            let names: Vec<&str> = request.tools.iter().map(|t| t.name.as_str()).collect();
            return Ok(Decision::final_answer(format!(
                "I can use these tools: {}",
                names.join(", ")
            )));
        }
        if contains_any(&format!("{} ", input), GREETING_KEYWORDS) {
            return Ok(Decision::final_answer(
                "Hello! I'm an assistant with a few tools. How can I help?",
            ));
        }

        Ok(Decision::final_answer(format!("I received: {}", input.trim())))
    }

    async fn synthesize(&self, request: DecideRequest) -> Result<String> {
        if request.transcript.is_empty() {
            return Ok("I could not reach an answer.".to_string());
        }
        let observations: Vec<&str> = request
            .transcript
            .iter()
            .map(|s| s.observation.as_str())
            .collect();
        Ok(observations.join("\n"))
    }

    fn default_model(&self) -> String {
        "keyword".to_string()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Step, ToolSpec};
    use serde_json::json;

    fn request(input: &str) -> DecideRequest {
        DecideRequest {
            input: input.to_string(),
            tools: ["calculator", "weather_search", "database_query"]
                .iter()
                .map(|n| ToolSpec::new(*n, "", json!({})))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_expression() {
        assert_eq!(extract_expression("What is 2+3?"), Some("2+3".to_string()));
        assert_eq!(
            extract_expression("计算 15 * 23 + 7"),
            Some("15 * 23 + 7".to_string())
        );
        assert_eq!(extract_expression("Room 101 please"), None);
        assert_eq!(extract_expression("no numbers here"), None);
    }

    #[test]
    fn test_extract_city() {
        assert_eq!(extract_city("What's the weather in Beijing?"), "Beijing");
        assert_eq!(extract_city("帮我查一下北京的天气"), "北京");
    }

    #[tokio::test]
    async fn test_selects_calculator() {
        let decision = KeywordReasoner.decide(request("What is 2+3?")).await.unwrap();
        assert_eq!(decision, Decision::use_tool("calculator", "2+3"));
    }

    #[tokio::test]
    async fn test_selects_weather() {
        let decision = KeywordReasoner
            .decide(request("weather in Paris"))
            .await
            .unwrap();
        assert_eq!(decision, Decision::use_tool("weather_search", "Paris"));
    }

    #[tokio::test]
    async fn test_answers_with_last_observation() {
        let mut req = request("What is 2+3?");
        req.transcript.push(Step::new("calculator", "2+3", "Result: 5"));
        let decision = KeywordReasoner.decide(req).await.unwrap();
        assert_eq!(decision, Decision::final_answer("Result: 5"));
    }

    #[tokio::test]
    async fn test_skips_missing_tools() {
        let mut req = request("What is 2+3?");
        req.tools.clear();
        let decision = KeywordReasoner.decide(req).await.unwrap();
        assert_eq!(decision, Decision::final_answer("I received: What is 2+3?"));
    }

    #[tokio::test]
    async fn test_synthesize_joins_observations() {
        let mut req = request("x");
        req.transcript.push(Step::new("a", "1", "first"));
        req.transcript.push(Step::new("b", "2", "second"));
        assert_eq!(KeywordReasoner.synthesize(req).await.unwrap(), "first\nsecond");
    }
}
