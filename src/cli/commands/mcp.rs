//! MCP command implementation.

use crate::cli::preflight::{self, Operation};
use crate::config::Settings;
use crate::mcp::McpServer;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the MCP server.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    preflight::check(&settings, Operation::Research)?;
    let server = McpServer::new(Orchestrator::new(settings)?);
    server.run().await
}
