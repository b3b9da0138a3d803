//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::{ingest_file, is_pdf, open_memory_store};
use anyhow::Result;
use std::path::Path;

/// Run the ingest command.
pub async fn run_ingest(path: &str, settings: Settings) -> Result<()> {
    let path = Settings::expand_path(path);
    let operation = if is_pdf(&path) {
        Operation::IngestPdf
    } else {
        Operation::Store
    };
    preflight::check(&settings, operation)?;

    let store = open_memory_store(&settings)?;

    let spinner = Output::spinner(&format!("Indexing {}...", display_name(&path)));
    let result = ingest_file(&store, &path).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            Output::success(&format!(
                "Indexed {} ({} chunks, {} characters)",
                outcome.source, outcome.chunks, outcome.characters
            ));
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingest failed: {}", e));
            Err(e.into())
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
