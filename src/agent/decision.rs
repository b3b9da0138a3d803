//! Parsing of the model's per-iteration decision.

use crate::error::{Result, SleuthError};
use crate::tools::ToolCall;
use serde::Deserialize;
use serde_json::Value;

/// Pseudo-tool name that ends the loop.
pub const COMPLETE_ACTION: &str = "complete";

/// What the loop should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Complete,
    Tool(ToolCall),
}

/// A parsed decision: the model's reasoning plus the chosen action.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub thought: String,
    pub action: Action,
}

#[derive(Deserialize)]
struct RawDecision {
    #[serde(default)]
    thought: Option<String>,
    #[serde(default)]
    action: Option<RawAction>,
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<Value>,
}

impl Decision {
    /// Parse a decision from the model's JSON reply.
    ///
    /// A missing action, a missing name or the name `complete` all end the
    /// loop. Anything else must be a known tool with valid arguments.
    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawDecision = serde_json::from_str(strip_fences(text))
            .map_err(|e| SleuthError::Decision(e.to_string()))?;

        let thought = raw.thought.unwrap_or_default();
        let action = match raw.action {
            None => Action::Complete,
            Some(RawAction { name: None, .. }) => Action::Complete,
            Some(RawAction { name: Some(name), .. }) if name == COMPLETE_ACTION => Action::Complete,
            Some(RawAction {
                name: Some(name),
                arguments,
            }) => {
                let call = ToolCall::from_parts(&name, arguments.unwrap_or(Value::Null))
                    .map_err(|e| SleuthError::Decision(e.to_string()))?;
                Action::Tool(call)
            }
        };

        Ok(Self { thought, action })
    }
}

/// Some models wrap JSON mode output in a markdown fence anyway.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_action() {
        let decision = Decision::parse(
            r#"{"thought": "look it up", "action": {"name": "web_search", "arguments": {"query": "rust 2024 edition"}}}"#,
        )
        .unwrap();
        assert_eq!(decision.thought, "look it up");
        assert_eq!(
            decision.action,
            Action::Tool(ToolCall::WebSearch {
                query: "rust 2024 edition".to_string()
            })
        );
    }

    #[test]
    fn test_complete_variants() {
        for text in [
            r#"{"action": {"name": "complete"}}"#,
            r#"{"thought": "done", "action": {"name": "complete", "arguments": {}}}"#,
            r#"{"thought": "done", "action": {"arguments": {}}}"#,
            r#"{"thought": "done", "action": {"name": null}}"#,
            r#"{"thought": "nothing else to do"}"#,
        ] {
            assert_eq!(Decision::parse(text).unwrap().action, Action::Complete, "{}", text);
        }
    }

    #[test]
    fn test_malformed_json_is_a_decision_error() {
        let err = Decision::parse("I think I should search the web").unwrap_err();
        assert!(matches!(err, SleuthError::Decision(_)));
    }

    #[test]
    fn test_schema_violations_are_decision_errors() {
        let unknown = Decision::parse(r#"{"action": {"name": "delete_everything", "arguments": {}}}"#);
        assert!(matches!(unknown, Err(SleuthError::Decision(_))));

        let missing_arg = Decision::parse(r#"{"action": {"name": "fetch_page_content", "arguments": {}}}"#);
        assert!(matches!(missing_arg, Err(SleuthError::Decision(_))));

        let wrong_shape = Decision::parse(r#"{"thought": 3, "action": {"name": "clear_rag"}}"#);
        assert!(matches!(wrong_shape, Err(SleuthError::Decision(_))));
    }

    #[test]
    fn test_fenced_json() {
        let decision = Decision::parse("```json\n{\"action\": {\"name\": \"clear_rag\"}}\n```").unwrap();
        assert_eq!(decision.action, Action::Tool(ToolCall::ClearRag));
    }
}
