//! Test doubles shared by the unit tests.

use crate::embedding::{Embedder, EMBEDDING_DIMENSIONS};
use crate::error::{Result, SleuthError};
use crate::llm::{ChatModel, CompletionRequest};
use crate::tools::{PageFetcher, ToolInvoker, ToolOutput, WebSearch};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Words that map onto a shared "concept" axis, so synonyms land close together.
const CONCEPTS: &[&[&str]] = &[
    &["fox", "dog", "cat", "animal", "pets", "lazy", "jumps", "chased"],
    &["chef", "cook", "cooked", "pasta", "dinner", "spicy", "delicious", "recipes", "tomato", "sauce", "food", "prepared", "make"],
    &["stocks", "markets", "fell", "shares", "monday"],
    &["rust", "cargo", "compiler", "borrow"],
];

/// Number of leading dimensions reserved for concepts.
const CONCEPT_DIMS: usize = 16;

/// Deterministic embedder: concept words dominate, other words add a small hashed component.
pub struct FakeEmbedder {
    dimensions: usize,
    calls: AtomicUsize,
    fail_next: AtomicBool,
    delay: Option<Duration>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self::with_dimensions(EMBEDDING_DIMENSIONS)
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            delay: None,
        }
    }

    /// Sleep this long inside every batch embedding call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of embed or embed_batch calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next call fail with an embedding error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dimensions];
        for raw in text.split_whitespace() {
            let word: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            match CONCEPTS.iter().position(|group| group.contains(&word.as_str())) {
                Some(concept) => v[concept] += 1.0,
                None => {
                    let hash = word
                        .bytes()
                        .fold(2166136261_u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
                    let slot = CONCEPT_DIMS + hash as usize % (self.dimensions - CONCEPT_DIMS);
                    v[slot] += 0.1;
                }
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn check(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(SleuthError::Embedding("embedding model unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.check()?;
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.check()?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Canned reply for a scripted collaborator.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }

    pub fn fail(s: impl Into<String>) -> Self {
        Reply::Fail(s.into())
    }
}

/// Chat model that replays replies in order and records every request.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail(message)) => Err(SleuthError::Llm(message)),
            None => Err(SleuthError::Llm("script exhausted".to_string())),
        }
    }
}

/// Tool invoker that answers from per-tool reply queues and records calls.
pub struct ScriptedTools {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedTools {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(self, name: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolInvoker for ScriptedTools {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(|q| q.pop_front());
        match reply {
            Some(Reply::Text(text)) => Ok(ToolOutput::text(text)),
            Some(Reply::Fail(message)) => Err(SleuthError::Tool(message)),
            None => Ok(ToolOutput::text(String::new())),
        }
    }
}

/// Web search returning a fixed list of URLs.
pub struct FakeSearch {
    pub urls: Vec<String>,
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, _query: &str, max_results: usize) -> Result<Vec<String>> {
        Ok(self.urls.iter().take(max_results).cloned().collect())
    }
}

/// Fetcher serving pages from a map; unknown URLs fail.
pub struct FakeFetcher {
    pub pages: HashMap<String, String>,
}

impl FakeFetcher {
    pub fn with_page(url: &str, text: &str) -> Self {
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), text.to_string());
        Self { pages }
    }

    fn lookup(&self, url: &str) -> Result<String> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| SleuthError::Fetch(format!("404 for {}", url)))
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        self.lookup(url)
    }

    async fn fetch_pdf(&self, url: &str) -> Result<String> {
        self.lookup(url)
    }
}
