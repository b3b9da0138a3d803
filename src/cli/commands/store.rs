//! Memory store commands: search, sources and clear.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::open_memory_store;
use anyhow::Result;
use std::io::{BufRead, Write};

/// Run the search command.
pub async fn run_search(query: &str, k: usize, settings: Settings) -> Result<()> {
    preflight::check(&settings, Operation::Store)?;
    let store = open_memory_store(&settings)?;

    let spinner = Output::spinner("Searching...");
    let results = store.retrieve(query, k).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) if results.is_empty() => {
            Output::warning("No results found. Index something with 'sleuth ingest <path>' or 'sleuth research <query>'.");
        }
        Ok(results) => {
            Output::success(&format!("Found {} results", results.len()));
            for (i, result) in results.iter().enumerate() {
                Output::search_result(i + 1, result.chunk.source(), result.distance, &result.chunk.text);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}

/// Run the sources command.
pub fn run_sources(settings: Settings) -> Result<()> {
    preflight::check(&settings, Operation::Store)?;
    let store = open_memory_store(&settings)?;

    let sources = store.sources()?;
    if sources.is_empty() {
        Output::info("Nothing indexed yet.");
        return Ok(());
    }

    Output::header(&format!("Indexed Sources ({})", sources.len()));
    println!();
    for summary in &sources {
        Output::list_item(&format!("{} ({} chunks)", summary.source, summary.chunk_count));
    }

    let total: usize = sources.iter().map(|s| s.chunk_count).sum();
    println!();
    Output::kv("Total chunks", &total.to_string());

    Ok(())
}

/// Run the clear command.
pub fn run_clear(yes: bool, settings: Settings) -> Result<()> {
    preflight::check(&settings, Operation::Store)?;
    let store = open_memory_store(&settings)?;

    let count = store.len()?;
    if count == 0 {
        Output::info("Memory store is already empty.");
        return Ok(());
    }

    if !yes && !confirm(&format!("Remove all {} chunks from the memory store?", count))? {
        Output::info("Aborted.");
        return Ok(());
    }

    store.clear()?;
    Output::success(&format!("Removed {} chunks.", count));
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
