//! Run context for Sleuth.
//!
//! Builds every collaborator from `Settings` once and hands them to the
//! components that need them: the chat model, the embedder behind the shared
//! memory store, web search and fetching behind the tool catalog.

use crate::agent::{AgentState, ResearchAgent};
use crate::chunking::WordChunker;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SleuthError};
use crate::llm::{ChatModel, OpenAiChat};
use crate::tools::{pdf_to_text, DuckDuckGoSearch, HttpFetcher, PageFetcher, ToolCatalog, WebSearch};
use crate::vector_store::MemoryStore;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// The top-level run context.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    llm: Arc<dyn ChatModel>,
    store: Arc<MemoryStore>,
    catalog: Arc<ToolCatalog>,
}

impl Orchestrator {
    /// Build every collaborator from settings.
    ///
    /// Fails if either API key is missing.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let llm_key = settings.llm_api_key()?;
        let llm: Arc<dyn ChatModel> = Arc::new(OpenAiChat::from_settings(&settings.llm, &llm_key)?);
        info!("Using {} at {}", settings.llm.model, settings.llm.api_base);

        let store = Arc::new(open_memory_store(&settings)?);

        let timeout = Duration::from_secs(settings.search.timeout_seconds);
        let search: Arc<dyn WebSearch> =
            Arc::new(DuckDuckGoSearch::new(&settings.search.user_agent, timeout)?);
        let fetcher: Arc<dyn PageFetcher> =
            Arc::new(HttpFetcher::new(&settings.search.user_agent, timeout)?);

        Ok(Self::with_components(settings, prompts, llm, store, search, fetcher))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        llm: Arc<dyn ChatModel>,
        store: Arc<MemoryStore>,
        search: Arc<dyn WebSearch>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let catalog = Arc::new(
            ToolCatalog::new(store.clone(), search, fetcher)
                .with_max_results(settings.search.max_results),
        );

        Self {
            settings,
            prompts,
            llm,
            store,
            catalog,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    pub fn catalog(&self) -> Arc<ToolCatalog> {
        self.catalog.clone()
    }

    /// A research agent configured from settings, acting through the catalog.
    pub fn agent(&self) -> ResearchAgent {
        ResearchAgent::new(self.llm.clone(), self.catalog.clone(), &self.settings.llm.model)
            .with_prompts(self.prompts.clone())
            .with_max_iterations(self.settings.agent.max_iterations)
            .with_tool_timeout(self.settings.tool_timeout())
            .with_planning(self.settings.agent.plan_first)
            .with_retrieve_k(self.settings.agent.retrieve_k)
    }

    /// Research `query` with the configured agent.
    pub async fn research(&self, query: &str) -> AgentState {
        self.agent().run(query).await
    }

    /// Index a local file into the shared memory store.
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestOutcome> {
        ingest_file(&self.store, path).await
    }
}

/// Result of ingesting a local file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Source label the chunks were stored under.
    pub source: String,
    /// Number of chunks added.
    pub chunks: usize,
    /// Characters of extracted text.
    pub characters: usize,
}

/// Index a local file into `store`.
///
/// PDFs go through `pdftotext`; anything else must be UTF-8 text. The
/// source label is the file name.
#[instrument(skip(store))]
pub async fn ingest_file(store: &MemoryStore, path: &Path) -> Result<IngestOutcome> {
    if !path.is_file() {
        return Err(SleuthError::InvalidInput(format!("File not found: {:?}", path)));
    }

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let text = if is_pdf(path) {
        pdf_to_text(path).await?
    } else {
        tokio::fs::read_to_string(path).await?
    };

    let chunks = store.add_document(&text, &source).await?;
    info!("Ingested {} ({} chunks)", source, chunks);

    Ok(IngestOutcome {
        source,
        chunks,
        characters: text.chars().count(),
    })
}

/// Whether `path` has a `.pdf` extension, ignoring case.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Open the memory store described by settings.
///
/// Needs the embedding key but not the chat key, so store-only commands can
/// run without one.
pub fn open_memory_store(settings: &Settings) -> Result<MemoryStore> {
    let key = settings.embedding_api_key()?;
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding, &key)?);
    build_memory_store(settings, embedder)
}

/// Open the memory store with a given embedder.
pub fn build_memory_store(settings: &Settings, embedder: Arc<dyn Embedder>) -> Result<MemoryStore> {
    let chunker = WordChunker::new(settings.memory.chunk_words);
    let store = if settings.memory.persist {
        MemoryStore::open(&settings.sqlite_path(), embedder)?
    } else {
        MemoryStore::in_memory(embedder)
    };
    Ok(store.with_chunker(chunker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEmbedder, FakeFetcher, FakeSearch, Reply, ScriptedModel};
    use std::collections::HashMap;
    use std::io::Write;

    fn orchestrator(model: Arc<ScriptedModel>) -> Orchestrator {
        let mut settings = Settings::default();
        settings.memory.persist = false;
        let store = Arc::new(build_memory_store(&settings, Arc::new(FakeEmbedder::new())).unwrap());
        Orchestrator::with_components(
            settings,
            Prompts::builtin(),
            model,
            store,
            Arc::new(FakeSearch { urls: vec![] }),
            Arc::new(FakeFetcher {
                pages: HashMap::new(),
            }),
        )
    }

    #[tokio::test]
    async fn test_ingest_text_file_uses_file_name() {
        let orch = orchestrator(Arc::new(ScriptedModel::new(vec![])));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Stocks fell on Monday as markets reacted.").unwrap();

        let outcome = orch.ingest_path(&path).await.unwrap();
        assert_eq!(outcome.source, "notes.md");
        assert_eq!(outcome.chunks, 1);

        let sources = orch.store().sources().unwrap();
        assert_eq!(sources[0].source, "notes.md");
    }

    #[tokio::test]
    async fn test_ingest_missing_file() {
        let orch = orchestrator(Arc::new(ScriptedModel::new(vec![])));
        let result = orch.ingest_path(Path::new("/definitely/not/here.txt")).await;
        assert!(matches!(result, Err(SleuthError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_research_answers_from_uploaded_document() {
        let model = Arc::new(ScriptedModel::new(vec![
            Reply::text("RESEARCH"),
            Reply::text(r#"{"thought": "check uploads", "action": {"name": "query_rag", "arguments": {"query": "markets"}}}"#),
            Reply::text(r#"{"thought": "done", "action": {"name": "complete"}}"#),
            Reply::text("Markets fell [Source 1]."),
        ]));
        let orch = orchestrator(model.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brief.txt");
        std::fs::write(&path, "Stocks fell sharply on Monday.").unwrap();
        orch.ingest_path(&path).await.unwrap();

        let state = orch.research("What happened to markets?").await;
        assert_eq!(state.report, "Markets fell [Source 1].");
        assert_eq!(state.tools_used(), &["query_rag"]);

        let synthesis = model.requests().pop().unwrap();
        assert!(synthesis.messages[1].content.contains("`brief.txt` (uploaded document)"));
    }

    #[test]
    fn test_new_requires_api_keys() {
        let mut settings = Settings::default();
        settings.llm.api_key_env = "SLEUTH_TEST_KEY_THAT_IS_NOT_SET".to_string();
        let result = Orchestrator::new(settings);
        assert!(matches!(result, Err(SleuthError::Config(_))));
    }
}
