//! In-process tool catalog backed by the shared memory store.

use super::{PageFetcher, ToolCall, ToolInvoker, ToolOutput, WebSearch};
use crate::error::{Result, SleuthError};
use crate::vector_store::{Chunk, MemoryStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Executes catalog tools against the memory store and web collaborators.
pub struct ToolCatalog {
    store: Arc<MemoryStore>,
    search: Arc<dyn WebSearch>,
    fetcher: Arc<dyn PageFetcher>,
    max_results: usize,
}

impl ToolCatalog {
    pub fn new(
        store: Arc<MemoryStore>,
        search: Arc<dyn WebSearch>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            store,
            search,
            fetcher,
            max_results: 5,
        }
    }

    /// Cap the number of URLs a web search returns.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// The store this catalog writes into.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Execute a validated tool call.
    #[instrument(skip(self), fields(tool = call.name()))]
    pub async fn execute(&self, call: &ToolCall) -> Result<String> {
        match call {
            ToolCall::WebSearch { query } => self.execute_web_search(query).await,
            ToolCall::FetchPageContent { url } => {
                let text = self.fetcher.fetch_page(url).await?;
                self.index_fetched(url, &text, "content").await
            }
            ToolCall::FetchPdfContent { url } => {
                let text = self.fetcher.fetch_pdf(url).await?;
                self.index_fetched(url, &text, "PDF content").await
            }
            ToolCall::QueryRag { query, k } => self.execute_query_rag(query, *k).await,
            ToolCall::IndexText { text, source } => {
                self.store.add_document(text, source).await?;
                Ok(format!("Indexed text from {} (Length: {})", source, text.len()))
            }
            ToolCall::ClearRag => {
                self.store.clear()?;
                Ok("RAG store cleared successfully.".to_string())
            }
        }
    }

    async fn execute_web_search(&self, query: &str) -> Result<String> {
        let urls = self.search.search(query, self.max_results).await?;
        debug!("Search returned {} URLs", urls.len());
        Ok(serde_json::to_string(&urls)?)
    }

    async fn index_fetched(&self, url: &str, text: &str, kind: &str) -> Result<String> {
        if text.trim().is_empty() {
            warn!("No text extracted from {}", url);
            return Err(SleuthError::Tool(format!("Failed to fetch {} from {}", kind, url)));
        }

        self.store.add_document(text, url).await?;
        Ok(format!(
            "Fetched and indexed {} from {} (Length: {})",
            kind,
            url,
            text.len()
        ))
    }

    async fn execute_query_rag(&self, query: &str, k: i64) -> Result<String> {
        if k <= 0 {
            return Err(SleuthError::InvalidInput(format!(
                "k must be a positive integer, got {}",
                k
            )));
        }

        let results = self.store.retrieve(query, k as usize).await?;
        let chunks: Vec<Chunk> = results.into_iter().map(|r| r.chunk).collect();
        Ok(serde_json::to_string(&chunks)?)
    }
}

#[async_trait]
impl ToolInvoker for ToolCatalog {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput> {
        let call = ToolCall::from_parts(name, arguments)?;
        self.execute(&call).await.map(ToolOutput::text)
    }
}
