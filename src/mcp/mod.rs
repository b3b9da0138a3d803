//! MCP (Model Context Protocol) server for Sleuth.
//!
//! Exposes the tool catalog, a whole-run research tool and the indexed
//! knowledge to MCP clients. Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;
mod tools;

pub use protocol::{JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
pub use tools::{KNOWLEDGE_URI, RESEARCH_TOOL};
