//! Deterministic cache keys

use sha2::{Digest, Sha256};

/// Trim and collapse runs of whitespace
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Cache key for an agent run
pub fn fingerprint(session_id: &str, input: &str) -> String {
    format!(
        "agent_session:{}:query:{}",
        session_id,
        digest(&normalize(input))
    )
}

/// Cache key for a run restricted to a set of tools
pub fn fingerprint_with_tools(session_id: &str, input: &str, tools: Option<&[String]>) -> String {
    let base = fingerprint(session_id, input);
    match tools {
        None => base,
        Some(tools) => {
            let mut names: Vec<&str> = tools.iter().map(String::as_str).collect();
            names.sort_unstable();
            names.dedup();
            format!("{}:tools:{}", base, digest(&names.join(",")))
        }
    }
}

/// `{namespace}_{sha256(text)}`
pub fn derive_key(namespace: &str, text: &str) -> String {
    format!("{}_{}", namespace, digest(text))
}
