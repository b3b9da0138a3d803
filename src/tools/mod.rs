//! The fixed tool catalog the reasoning loop may call.
//!
//! Tools are invoked by name with a JSON argument object and answer with
//! plain text. `ToolCall` is the strict schema for those invocations;
//! `ToolInvoker` is the call protocol, implemented in-process by
//! `ToolCatalog` and substitutable in tests.

mod catalog;
mod fetch;
mod search;

pub use catalog::ToolCatalog;
pub use fetch::{html_to_text, pdf_to_text, HttpFetcher, PageFetcher};
pub use search::{extract_result_links, DuckDuckGoSearch, WebSearch};

use crate::error::{Result, SleuthError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    /// Search the web for candidate URLs.
    WebSearch { query: String },

    /// Fetch a web page and index its text.
    FetchPageContent { url: String },

    /// Fetch a PDF and index its text.
    FetchPdfContent { url: String },

    /// Query the memory store.
    QueryRag {
        query: String,
        #[serde(default = "default_k")]
        k: i64,
    },

    /// Index text directly.
    IndexText {
        text: String,
        #[serde(default = "default_source")]
        source: String,
    },

    /// Remove everything from the memory store.
    ClearRag,
}

fn default_k() -> i64 {
    5
}

fn default_source() -> String {
    "manual".to_string()
}

impl ToolCall {
    /// Build a call from a tool name and its argument object.
    ///
    /// Unknown names and missing or mistyped arguments are rejected.
    pub fn from_parts(name: &str, arguments: Value) -> Result<Self> {
        if !TOOL_NAMES.contains(&name) {
            return Err(SleuthError::InvalidInput(format!("Unknown tool: {}", name)));
        }

        let mut object = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(SleuthError::InvalidInput(format!(
                    "Arguments for {} must be an object, got {}",
                    name, other
                )))
            }
        };
        object.insert("name".to_string(), Value::String(name.to_string()));

        serde_json::from_value(Value::Object(object))
            .map_err(|e| SleuthError::InvalidInput(format!("Invalid arguments for {}: {}", name, e)))
    }

    /// The tool name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::WebSearch { .. } => "web_search",
            ToolCall::FetchPageContent { .. } => "fetch_page_content",
            ToolCall::FetchPdfContent { .. } => "fetch_pdf_content",
            ToolCall::QueryRag { .. } => "query_rag",
            ToolCall::IndexText { .. } => "index_text",
            ToolCall::ClearRag => "clear_rag",
        }
    }

    /// The argument object sent on the wire.
    pub fn arguments(&self) -> Value {
        match self {
            ToolCall::WebSearch { query } => json!({ "query": query }),
            ToolCall::FetchPageContent { url } | ToolCall::FetchPdfContent { url } => {
                json!({ "url": url })
            }
            ToolCall::QueryRag { query, k } => json!({ "query": query, "k": k }),
            ToolCall::IndexText { text, source } => json!({ "text": text, "source": source }),
            ToolCall::ClearRag => json!({}),
        }
    }

    /// URL targeted by a fetch tool.
    pub fn fetched_url(&self) -> Option<&str> {
        match self {
            ToolCall::FetchPageContent { url } | ToolCall::FetchPdfContent { url } => Some(url),
            _ => None,
        }
    }
}

/// Names of every tool in the catalog.
pub const TOOL_NAMES: &[&str] = &[
    "web_search",
    "fetch_page_content",
    "fetch_pdf_content",
    "query_rag",
    "index_text",
    "clear_rag",
];

/// Text returned by a successful tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Tool invocation protocol.
///
/// A failed call is an `Err`, distinguishable from a successful call that
/// produced empty content.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput>;
}

/// Name, description and JSON schema of a tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, input_schema: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }

    /// One-line signature used in the agent prompt, e.g. `web_search(query: string)`.
    pub fn signature(&self) -> String {
        let params = self
            .input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, schema)| {
                        let ty = schema.get("type").and_then(Value::as_str).unwrap_or("any");
                        format!("{}: {}", name, ty)
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        format!("{}({})", self.name, params)
    }
}

/// Definitions for every catalog tool.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "web_search",
            "Search the web. Returns a JSON list of result URLs.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::new(
            "fetch_page_content",
            "Fetch the text of a web page or blog post and index it into the memory store.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "Page URL" }
                },
                "required": ["url"]
            }),
        ),
        ToolDefinition::new(
            "fetch_pdf_content",
            "Fetch the text of a PDF and index it into the memory store.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "PDF URL" }
                },
                "required": ["url"]
            }),
        ),
        ToolDefinition::new(
            "query_rag",
            "Return the indexed passages most relevant to a query, including local uploads, as JSON.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "What to look for" },
                    "k": { "type": "integer", "description": "Number of passages", "default": 5 }
                },
                "required": ["query"]
            }),
        ),
        ToolDefinition::new(
            "index_text",
            "Index a piece of text directly into the memory store.",
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "Text to index" },
                    "source": { "type": "string", "description": "Source label", "default": "manual" }
                },
                "required": ["text"]
            }),
        ),
        ToolDefinition::new(
            "clear_rag",
            "Remove every document from the memory store.",
            json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        ),
    ]
}

/// Tool list formatted for the agent's system prompt.
pub fn describe_tools() -> String {
    tool_definitions()
        .iter()
        .map(|d| format!("- {}: {}", d.signature(), d.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web_search() {
        let call = ToolCall::from_parts("web_search", json!({ "query": "rust async" })).unwrap();
        assert_eq!(
            call,
            ToolCall::WebSearch {
                query: "rust async".to_string()
            }
        );
    }

    #[test]
    fn test_parse_defaults() {
        let call = ToolCall::from_parts("query_rag", json!({ "query": "q" })).unwrap();
        assert_eq!(call, ToolCall::QueryRag { query: "q".to_string(), k: 5 });

        let call = ToolCall::from_parts("index_text", json!({ "text": "t" })).unwrap();
        assert_eq!(
            call,
            ToolCall::IndexText {
                text: "t".to_string(),
                source: "manual".to_string()
            }
        );

        assert_eq!(ToolCall::from_parts("clear_rag", Value::Null).unwrap(), ToolCall::ClearRag);
        assert_eq!(ToolCall::from_parts("clear_rag", json!({})).unwrap(), ToolCall::ClearRag);
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(ToolCall::from_parts("rm_rf", json!({})).is_err());
        assert!(ToolCall::from_parts("web_search", json!({})).is_err());
        assert!(ToolCall::from_parts("web_search", json!({ "query": 7 })).is_err());
        assert!(ToolCall::from_parts("fetch_page_content", json!("https://x")).is_err());
    }

    #[test]
    fn test_name_and_arguments_rebuild_the_call() {
        let calls = vec![
            ToolCall::WebSearch { query: "a".into() },
            ToolCall::FetchPdfContent { url: "https://x/y.pdf".into() },
            ToolCall::QueryRag { query: "b".into(), k: 2 },
            ToolCall::ClearRag,
        ];
        for call in calls {
            assert_eq!(ToolCall::from_parts(call.name(), call.arguments()).unwrap(), call);
        }
    }

    #[test]
    fn test_definitions_cover_every_tool() {
        let names: Vec<String> = tool_definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, TOOL_NAMES.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn test_signature() {
        let defs = tool_definitions();
        assert_eq!(defs[0].signature(), "web_search(query: string)");
        assert!(describe_tools().contains("- clear_rag(): "));
    }
}
