//! CLI command implementations.

mod config;
mod doctor;
mod ingest;
mod mcp;
mod research;
mod serve;
mod store;

pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use mcp::run_mcp;
pub use research::run_research;
pub use serve::run_serve;
pub use store::{run_clear, run_search, run_sources};
