//! Doctor command - verify system requirements and configuration.

use crate::chunking::truncate_chars;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: Option<&str>) -> anyhow::Result<()> {
    Output::header("Sleuth Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_check = check_tool("pdftotext", install_hint_poppler());
    tool_check.print();
    checks.push(tool_check);

    println!();

    println!("{}", style("API Configuration").bold());
    let key_checks = vec![
        check_api_key(&settings.llm.api_key_env, "LLM"),
        check_api_key(&settings.embedding.api_key_env, "embeddings"),
    ];
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Memory Store").bold());
    let store_checks = check_memory_store(settings);
    for check in &store_checks {
        check.print();
    }
    checks.extend(store_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Sleuth.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Sleuth is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
///
/// `pdftotext -v` writes its version to stderr.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("-v").output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stderr)
                .lines()
                .chain(String::from_utf8_lossy(&output.stdout).lines())
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or("installed")
                .to_string();
            CheckResult::ok(name, &short(&version, 50))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (PDF fetching and ingest disabled)", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check that an API key is present in the environment.
fn check_api_key(var: &str, purpose: &str) -> CheckResult {
    check_api_key_value(var, purpose, std::env::var(var).ok())
}

fn check_api_key_value(var: &str, purpose: &str, value: Option<String>) -> CheckResult {
    let hint = format!("Set with: export {}='...'", var);
    match value {
        Some(key) if key.trim().is_empty() => CheckResult::error(var, "empty", &hint),
        Some(key) => CheckResult::ok(var, &format!("configured for {} ({})", purpose, mask(&key))),
        None => CheckResult::error(var, "not set", &hint),
    }
}

/// Check the SQLite database behind the memory store.
fn check_memory_store(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if !settings.memory.persist {
        results.push(CheckResult::warning(
            "Persistence",
            "disabled",
            "Indexed content is lost when the process exits",
        ));
        return results;
    }

    let data_dir = settings.data_dir();
    if data_dir.exists() {
        results.push(CheckResult::ok("Data directory", &format!("{}", data_dir.display())));
    } else {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
    }

    let db_path = settings.sqlite_path();
    if db_path.exists() {
        let size = std::fs::metadata(&db_path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        results.push(CheckResult::ok(
            "Database",
            &format!("{} ({})", db_path.display(), size),
        ));
    } else {
        results.push(CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", db_path.display()),
            "Database will be created on first ingest or research run",
        ));
    }

    results
}

/// Check if config file exists.
fn check_config_file(config_path: Option<&str>) -> CheckResult {
    let path = config_path
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    if path.exists() {
        CheckResult::ok("Config file", &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override", path.display()),
        )
    }
}

/// Mask all but the edges of a secret.
fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn short(text: &str, max: usize) -> String {
    let head = truncate_chars(text, max);
    if head.len() < text.len() {
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for pdftotext.
fn install_hint_poppler() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install poppler"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install poppler-utils (or your package manager)"
    } else {
        "Install from: https://poppler.freedesktop.org"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_api_key_checks() {
        let result = check_api_key_value("GROQ_API_KEY", "LLM", None);
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint.as_deref(), Some("Set with: export GROQ_API_KEY='...'"));

        let result = check_api_key_value("GROQ_API_KEY", "LLM", Some("  ".to_string()));
        assert_eq!(result.status, CheckStatus::Error);

        let result = check_api_key_value("GROQ_API_KEY", "LLM", Some("gsk_abcdefghijklmnop".to_string()));
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("gsk_...mnop"));
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask("short"), "****");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
