//! Sleuth CLI entry point.

use anyhow::Result;
use clap::Parser;
use sleuth::cli::{commands, Cli, Commands};
use sleuth::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging; logs go to stderr so stdout stays clean for MCP and --json
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("sleuth={}", log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Research {
            query,
            json,
            max_iterations,
            plan,
        } => {
            commands::run_research(query, *json, *max_iterations, *plan, settings).await?;
        }

        Commands::Ingest { path } => {
            commands::run_ingest(path, settings).await?;
        }

        Commands::Search { query, k } => {
            commands::run_search(query, *k, settings).await?;
        }

        Commands::Sources => {
            commands::run_sources(settings)?;
        }

        Commands::Clear { yes } => {
            commands::run_clear(*yes, settings)?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, *port, settings).await?;
        }

        Commands::Mcp => {
            commands::run_mcp(settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
