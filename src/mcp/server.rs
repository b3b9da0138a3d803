//! MCP server implementation.

use super::protocol::*;
use super::tools::{get_resources, get_tools, KNOWLEDGE_SEPARATOR, KNOWLEDGE_URI, RESEARCH_TOOL};
use crate::orchestrator::Orchestrator;
use crate::tools::ToolInvoker;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "sleuth";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const INTERNAL_ERROR: i32 = -32603;

/// MCP Server for Sleuth.
pub struct McpServer {
    orchestrator: Orchestrator,
}

impl McpServer {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        info!("Sleuth MCP server starting");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<JsonRpcRequest>(&line) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    warn!("Failed to parse request: {}", e);
                    Some(JsonRpcResponse::error(None, PARSE_ERROR, "Parse error"))
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        info!("stdin closed, shutting down");
        Ok(())
    }

    /// Handle a single JSON-RPC request. Notifications get no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("Handling {}", request.method);
        if request.is_notification() {
            return None;
        }

        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => respond(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => respond(id, ToolsListResult { tools: get_tools() }),
            "tools/call" => match parse_params::<ToolCallParams>(request.params) {
                Ok(params) => respond(id, self.call_tool(params).await),
                Err(message) => JsonRpcResponse::error(id, INVALID_PARAMS, &message),
            },
            "resources/list" => respond(
                id,
                ResourcesListResult {
                    resources: get_resources(),
                },
            ),
            "resources/read" => match parse_params::<ResourceReadParams>(request.params) {
                Ok(params) => self.read_resource(id, &params.uri),
                Err(message) => JsonRpcResponse::error(id, INVALID_PARAMS, &message),
            },
            other => JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                &format!("Method not found: {}", other),
            ),
        };
        Some(response)
    }

    fn initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ListChanged { list_changed: false },
                resources: ListChanged { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        }
    }

    /// Dispatch a tool call. Tool failures become `isError` results.
    async fn call_tool(&self, params: ToolCallParams) -> ToolCallResult {
        let arguments = params.arguments.unwrap_or(Value::Null);

        if params.name == RESEARCH_TOOL {
            return self.run_research(arguments).await;
        }

        match self.orchestrator.catalog().call_tool(&params.name, arguments).await {
            Ok(output) => ToolCallResult::text(output.content),
            Err(e) => {
                warn!("Tool {} failed: {}", params.name, e);
                ToolCallResult::error(e.to_string())
            }
        }
    }

    async fn run_research(&self, arguments: Value) -> ToolCallResult {
        let query = match arguments.get("query").and_then(Value::as_str) {
            Some(q) if !q.trim().is_empty() => q,
            _ => return ToolCallResult::error("Missing 'query' argument".to_string()),
        };

        let state = self.orchestrator.research(query).await;
        match serde_json::to_string_pretty(&state) {
            Ok(json) => ToolCallResult::text(json),
            Err(e) => ToolCallResult::error(format!("Failed to serialize result: {}", e)),
        }
    }

    fn read_resource(&self, id: Option<Value>, uri: &str) -> JsonRpcResponse {
        if uri != KNOWLEDGE_URI {
            return JsonRpcResponse::error(id, INVALID_PARAMS, &format!("Unknown resource: {}", uri));
        }

        match self.orchestrator.store().all_text() {
            Ok(texts) => respond(
                id,
                ResourceReadResult {
                    contents: vec![ResourceContents {
                        uri: KNOWLEDGE_URI.to_string(),
                        mime_type: "text/plain".to_string(),
                        text: texts.join(KNOWLEDGE_SEPARATOR),
                    }],
                },
            ),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string()),
        }
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    match params {
        Some(p) => serde_json::from_value(p).map_err(|e| format!("Invalid params: {}", e)),
        None => Err("Missing params".to_string()),
    }
}

fn respond<T: Serialize>(id: Option<Value>, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("Failed to serialize result: {}", e);
            JsonRpcResponse::error(id, INTERNAL_ERROR, &e.to_string())
        }
    }
}
