//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, SleuthError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Research needs both the chat and the embedding key.
    Research,
    /// Ingesting a PDF needs the embedding key and `pdftotext`.
    IngestPdf,
    /// Anything touching the memory store needs the embedding key.
    Store,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings, operation: Operation) -> Result<()> {
    match operation {
        Operation::Research => {
            settings.llm_api_key()?;
            settings.embedding_api_key()?;
        }
        Operation::IngestPdf => {
            settings.embedding_api_key()?;
            check_tool("pdftotext")?;
        }
        Operation::Store => {
            settings.embedding_api_key()?;
        }
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    // pdftotext prints its version with -v and exits 0 (older builds exit 99)
    match Command::new(name).arg("-v").output() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SleuthError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SleuthError::ToolFailed(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_config_error() {
        let mut settings = Settings::default();
        settings.embedding.api_key_env = "SLEUTH_PREFLIGHT_UNSET_KEY".to_string();
        assert!(matches!(
            check(&settings, Operation::Store),
            Err(SleuthError::Config(_))
        ));
    }

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("sleuth-no-such-binary"),
            Err(SleuthError::ToolNotFound(_))
        ));
    }
}
