//! Sleuth - autonomous research agent
//!
//! Given a question, Sleuth decides whether it needs research at all. If it
//! does, a reasoning loop asks the model for one JSON decision per step,
//! runs the chosen tool (web search, page or PDF fetch, memory lookup), and
//! feeds the observation back until the model is done. A cited report is then
//! written from the passages retrieved out of the shared memory store.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - Chat model abstraction and OpenAI-compatible client
//! - `embedding` - Embedding generation
//! - `chunking` - Word-window chunking and text truncation
//! - `vector_store` - Shared memory store with optional SQLite persistence
//! - `tools` - Tool catalog, web search and fetching
//! - `agent` - Intent classification, planning and the reasoning loop
//! - `rag` - Report synthesis from retrieved context
//! - `orchestrator` - Builds every collaborator from settings
//! - `mcp` - JSON-RPC tool server over stdio
//!
//! # Example
//!
//! ```rust,no_run
//! use sleuth::config::Settings;
//! use sleuth::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let state = orchestrator.research("How does Rust's borrow checker work?").await;
//!     println!("{}", state.report);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod orchestrator;
pub mod rag;
pub mod tools;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{Result, SleuthError};
