//! Error types for Sleuth.

use std::time::Duration;
use thiserror::Error;

/// Library-level error type for Sleuth operations.
#[derive(Error, Debug)]
pub enum SleuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Memory store error: {0}")]
    VectorStore(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Malformed decision: {0}")]
    Decision(String),

    #[error("{0}")]
    Tool(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Web search failed: {0}")]
    Search(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Sleuth operations.
pub type Result<T> = std::result::Result<T, SleuthError>;
