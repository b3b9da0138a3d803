//! MCP tool and resource definitions for Sleuth.

use super::protocol::Resource;
use crate::tools::{tool_definitions, ToolDefinition};
use serde_json::json;

/// Name of the tool that runs a whole research session.
pub const RESEARCH_TOOL: &str = "run_research_task";

/// URI of the knowledge resource.
pub const KNOWLEDGE_URI: &str = "rag://knowledge";

/// Separator between chunks in the knowledge resource.
pub const KNOWLEDGE_SEPARATOR: &str = "\n---\n";

/// Catalog tools plus the research entry point.
pub fn get_tools() -> Vec<ToolDefinition> {
    let mut tools = tool_definitions();
    tools.push(ToolDefinition {
        name: RESEARCH_TOOL.to_string(),
        description: "Research a question end to end: search the web, read and index sources, \
            and return a cited report together with the full run log as JSON."
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The research question"
                }
            },
            "required": ["query"]
        }),
    });
    tools
}

/// Resources the server exposes.
pub fn get_resources() -> Vec<Resource> {
    vec![Resource {
        uri: KNOWLEDGE_URI.to_string(),
        name: "Knowledge base".to_string(),
        description: "Every indexed chunk, in insertion order".to_string(),
        mime_type: "text/plain".to_string(),
    }]
}
