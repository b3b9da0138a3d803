//! Report synthesis from retrieved chunks.

use super::context::{format_context, format_references};
use crate::config::Prompts;
use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::vector_store::Chunk;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Returned when nothing was retrieved; the model is not called.
pub const NO_INFORMATION_REPORT: &str = "No information gathered to synthesize a report.";

/// Writes the final cited report.
pub struct ReportSynthesizer {
    llm: Arc<dyn ChatModel>,
    model: String,
    prompts: Prompts,
}

impl ReportSynthesizer {
    pub fn new(llm: Arc<dyn ChatModel>, model: &str) -> Self {
        Self {
            llm,
            model: model.to_string(),
            prompts: Prompts::default(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Produce a report answering `query` from `chunks`, cited as `[Source N]`.
    #[instrument(skip(self, chunks), fields(query = %query, chunks = chunks.len()))]
    pub async fn synthesize(&self, query: &str, chunks: &[Chunk]) -> Result<String> {
        if chunks.is_empty() {
            info!("No context retrieved, skipping synthesis");
            return Ok(NO_INFORMATION_REPORT.to_string());
        }

        let context = format_context(chunks);
        debug!("Context is {} characters", context.chars().count());

        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        vars.insert("context".to_string(), context);
        vars.insert("references".to_string(), format_references(chunks));

        let system = self.prompts.render_with_custom(&self.prompts.report.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.report.user, &vars);

        let request = CompletionRequest::new(
            &self.model,
            vec![ChatMessage::system(system), ChatMessage::user(user)],
        )
        .temperature(0.3)
        .max_tokens(1024);

        self.llm.complete(request).await
    }
}
