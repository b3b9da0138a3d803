//! Optional up-front research plan.

use crate::config::Prompts;
use crate::error::{Result, SleuthError};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use tracing::{debug, instrument};

/// Ask the model to break `query` into ordered steps.
#[instrument(skip(model, prompts))]
pub async fn create_plan(
    model: &dyn ChatModel,
    prompts: &Prompts,
    llm_model: &str,
    query: &str,
) -> Result<Vec<String>> {
    let request = CompletionRequest::new(
        llm_model,
        vec![
            ChatMessage::system(prompts.render_with_custom(&prompts.planner.system, &Default::default())),
            ChatMessage::user(query),
        ],
    )
    .temperature(0.2)
    .max_tokens(1024);

    let reply = model.complete(request).await?;
    let steps = parse_plan(&reply);
    if steps.is_empty() {
        return Err(SleuthError::Llm("Planner returned no steps".to_string()));
    }

    debug!("Plan has {} steps", steps.len());
    Ok(steps)
}

/// One step per non-blank line, bullet dashes trimmed.
pub fn parse_plan(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim_matches(|c: char| c == '-' || c.is_whitespace()))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render a plan as a numbered list for the first user message.
pub fn format_plan(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}
