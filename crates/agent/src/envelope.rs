//! Result envelope returned by every run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one `AgentCore::run`.
///
/// A non-empty `error` is the authoritative failure signal; `response` may
/// still hold a usable answer (e.g. when only persistence failed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub response: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultEnvelope {
    pub fn success(
        response: impl Into<String>,
        session_id: impl Into<String>,
        tools_used: Vec<String>,
    ) -> Self {
        Self {
            response: response.into(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            tools_used,
            error: None,
        }
    }

    pub fn failure(session_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            response: String::new(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            tools_used: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_omits_error_field() {
        let envelope = ResultEnvelope::success("5", "s1", vec!["calculator".into()]);
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["response"], "5");
        assert_eq!(json["tools_used"][0], "calculator");
        assert!(json.get("error").is_none());
        assert!(!envelope.is_error());
    }

    #[test]
    fn test_failure_is_error() {
        let envelope = ResultEnvelope::failure("s1", "Model error: rate limited");
        assert!(envelope.is_error());
        assert!(envelope.response.is_empty());

        let mut blank = envelope.clone();
        blank.error = Some(String::new());
        assert!(!blank.is_error());
    }

    #[test]
    fn test_serde_is_lossless() {
        let envelope = ResultEnvelope::success("answer", "s1", vec![]);
        let text = serde_json::to_string(&envelope).unwrap();
        let back: ResultEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, envelope);
        assert_eq!(serde_json::to_string(&back).unwrap(), text);
    }
}
