//! CLI module for Sleuth.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Sleuth - autonomous research agent
///
/// Searches the web, reads and indexes what it finds, and writes a cited
/// report from the gathered knowledge.
#[derive(Parser, Debug)]
#[command(name = "sleuth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SLEUTH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a question and print a cited report
    Research {
        /// The question to research
        query: String,

        /// Print the full run state as JSON
        #[arg(long)]
        json: bool,

        /// Override the iteration cap of the reasoning loop
        #[arg(short, long)]
        max_iterations: Option<usize>,

        /// Ask for a step plan before acting
        #[arg(long)]
        plan: bool,
    },

    /// Index a local text or PDF file into the memory store
    Ingest {
        /// Path to the file
        path: String,
    },

    /// Search the memory store
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        k: usize,
    },

    /// List indexed sources
    Sources,

    /// Remove everything from the memory store
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },

    /// Start MCP server exposing the research tools over stdio
    Mcp,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_research() {
        let cli = Cli::try_parse_from(["sleuth", "-vv", "research", "who wrote tokio?", "--json", "-m", "3"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Research {
                query,
                json,
                max_iterations,
                plan,
            } => {
                assert_eq!(query, "who wrote tokio?");
                assert!(json);
                assert_eq!(max_iterations, Some(3));
                assert!(!plan);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_default_k() {
        let cli = Cli::try_parse_from(["sleuth", "search", "borrow checker"]).unwrap();
        assert!(matches!(cli.command, Commands::Search { k: 5, .. }));
    }

    #[test]
    fn test_parse_config_path() {
        let cli = Cli::try_parse_from(["sleuth", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
