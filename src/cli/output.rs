//! CLI output formatting utilities.

use crate::agent::{AgentState, SourceStatus};
use crate::chunking::truncate_chars;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a retrieved chunk.
    pub fn search_result(rank: usize, source: &str, distance: f32, content: &str) {
        println!(
            "\n{} {} {} (distance: {:.3})",
            style(">>").green(),
            style(format!("[{}]", rank)).cyan(),
            style(source).bold(),
            distance
        );
        println!("   {}", content_preview(content, 200));
    }

    /// Print the report followed by a summary of the run.
    pub fn research_summary(state: &AgentState) {
        println!("\n{}\n", state.report);

        if !state.sources().is_empty() {
            Output::header(&format!("Sources ({})", state.sources().len()));
            for source in state.sources() {
                let mark = match source.status {
                    SourceStatus::Indexed => style("✓").green(),
                    SourceStatus::Failed => style("✗").red(),
                };
                println!("  {} {}", mark, source.url);
            }
            println!();
        }

        Output::info(&format!(
            "{} iteration(s), {} tool call(s)",
            state.iterations,
            state.tools_used().len()
        ));
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(spinner_style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Single-line preview of content.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    let head = truncate_chars(&content, max_chars);
    if head.len() < content.len() {
        format!("{}...", head)
    } else {
        content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_preview() {
        assert_eq!(content_preview("a\nb", 10), "a b");
        assert_eq!(content_preview("ééééé", 2), "éé...");
    }
}
