//! LLM client abstraction and decision parsing.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::LlmError;

/// One chat message in a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
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
}

/// Abstraction over chat-completion backends so multiple vendors can plug
/// into the agent core.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// One planning decision parsed from model output.
#[derive(Debug, Clone, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub done: bool,
}

impl Decision {
    /// Final message for a `done` decision.
    pub fn final_message(&self) -> String {
        self.args
            .get("final_message")
            .or_else(|| self.args.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if self.rationale.is_empty() {
                    "task complete".to_string()
                } else {
                    self.rationale.clone()
                }
            })
    }
}

/// Parse a raw completion into a decision.
///
/// Tolerates fenced code blocks and surrounding prose; anything without a
/// single decision object is a parse error.
pub fn parse_decision(raw: &str) -> Result<Decision, String> {
    let json = extract_json_object(raw).ok_or_else(|| "no JSON object in response".to_string())?;
    let decision: Decision =
        serde_json::from_str(&json).map_err(|err| format!("invalid decision JSON: {err}"))?;
    if decision.action.is_empty() && !decision.done {
        return Err("decision missing 'action' field".to_string());
    }
    if !decision.args.is_null() && !decision.args.is_object() {
        return Err("decision 'args' must be an object".to_string());
    }
    Ok(decision)
}

/// Pull the first JSON object out of a model response, tolerating fenced
/// blocks and leading prose.
pub fn extract_json_object(raw: &str) -> Option<String> {
    if raw.trim_start().starts_with('{') {
        return Some(trim_symmetric(raw));
    }

    let fence = "```";
    if let Some(start) = raw.find(fence) {
        let after_fence = &raw[start + fence.len()..];
        let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
        if let Some(end) = after_lang.find(fence) {
            let block = &after_lang[..end];
            if block.contains('{') {
                return Some(trim_symmetric(block));
            }
        }
    }

    raw.split('{').nth(1).and_then(|rest| {
        let mut depth = 1i32;
        for (idx, ch) in rest.char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let mut candidate = String::from("{");
                        candidate.push_str(&rest[..=idx]);
                        return Some(trim_symmetric(&candidate));
                    }
                }
                _ => {}
            }
        }
        None
    })
}

fn trim_symmetric(value: &str) -> String {
    value.trim().trim_matches('`').trim().to_string()
}

/// Deterministic client used for tests and offline development.
///
/// Serves scripted responses in order; once the script is exhausted it
/// answers with a `done` decision.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<u64>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(0),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().push_back(response.into());
    }

    pub fn calls(&self) -> u64 {
        *self.calls.lock()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        *self.calls.lock() += 1;
        Ok(self.responses.lock().pop_front().unwrap_or_else(|| {
            r#"{"action": "done", "args": {"final_message": "mock script exhausted"}, "rationale": "no further scripted steps", "done": true}"#
                .to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_object() {
        let decision = parse_decision(
            r#"{"action": "click", "args": {"ref": "e3"}, "rationale": "first result", "done": false}"#,
        )
        .unwrap();
        assert_eq!(decision.action, "click");
        assert_eq!(decision.args, json!({"ref": "e3"}));
        assert!(!decision.done);
    }

    #[test]
    fn test_parse_fenced_block() {
        let raw = "Here is my decision:\n```json\n{\"action\": \"wait\", \"args\": {\"seconds\": 2}, \"done\": false}\n```";
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.action, "wait");
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_decision("I think we should click the button").is_err());
    }

    #[test]
    fn test_parse_rejects_missing_action() {
        assert!(parse_decision(r#"{"args": {}, "done": false}"#).is_err());
    }

    #[test]
    fn test_done_without_action_accepted() {
        let decision =
            parse_decision(r#"{"done": true, "args": {"final_message": "finished"}}"#).unwrap();
        assert!(decision.done);
        assert_eq!(decision.final_message(), "finished");
    }

    #[test]
    fn test_final_message_falls_back_to_rationale() {
        let decision =
            parse_decision(r#"{"action": "done", "rationale": "all good", "done": true}"#).unwrap();
        assert_eq!(decision.final_message(), "all good");
    }

    #[tokio::test]
    async fn test_mock_client_script_then_done() {
        let client = MockLlmClient::scripted([r#"{"action": "screenshot", "args": {}, "done": false}"#]);
        let first = client.complete(&[]).await.unwrap();
        assert!(first.contains("screenshot"));
        let second = client.complete(&[]).await.unwrap();
        assert!(parse_decision(&second).unwrap().done);
        assert_eq!(client.calls(), 2);
    }
}
