//! Vector memory store.
//!
//! Chunk-level semantic index shared by every agent run. Documents are split
//! into word chunks, embedded, and appended to an arena whose positions tie
//! each chunk to exactly one vector. Retrieval is exact nearest-neighbour
//! search by L2 distance.
//!
//! The store serializes writers behind an `RwLock`. Embeddings are computed
//! before the lock is taken, and the persistence write plus the in-memory
//! append happen under the lock without any await in between, so a cancelled
//! caller can never leave a half-written batch.

mod arena;
mod sqlite;

pub use arena::l2_distance;

use crate::chunking::WordChunker;
use crate::embedding::Embedder;
use crate::error::{Result, SleuthError};
use arena::Arena;
use serde::{Deserialize, Serialize};
use sqlite::SqlitePersistence;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, instrument};

/// Per-chunk metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Where the chunk came from: a URL, a file name, or a manual label.
    pub source: String,
}

/// A slice of a document's words, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: ChunkMetadata {
                source: source.into(),
            },
        }
    }

    pub fn source(&self) -> &str {
        &self.metadata.source
    }
}

/// A retrieved chunk with its distance to the query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    /// Euclidean distance to the query embedding (lower is closer).
    pub distance: f32,
}

/// Number of chunks held for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub chunk_count: usize,
}

/// The shared memory store.
pub struct MemoryStore {
    embedder: Arc<dyn Embedder>,
    chunker: WordChunker,
    arena: RwLock<Arena>,
    persistence: Option<SqlitePersistence>,
}

impl MemoryStore {
    /// Create a store that lives only in memory.
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Self {
        let dimensions = embedder.dimensions();
        Self {
            embedder,
            chunker: WordChunker::default(),
            arena: RwLock::new(Arena::new(dimensions)),
            persistence: None,
        }
    }

    /// Open a persistent store backed by the SQLite database at `path`.
    ///
    /// Previously persisted chunks are loaded back in insertion order.
    pub fn open(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let dimensions = embedder.dimensions();
        let persistence = SqlitePersistence::open(path, dimensions)?;

        let mut arena = Arena::new(dimensions);
        arena.append(persistence.load()?)?;
        info!("Memory store holds {} chunks", arena.len());

        Ok(Self {
            embedder,
            chunker: WordChunker::default(),
            arena: RwLock::new(arena),
            persistence: Some(persistence),
        })
    }

    /// Use a different chunk size.
    pub fn with_chunker(mut self, chunker: WordChunker) -> Self {
        self.chunker = chunker;
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arena>> {
        self.arena
            .read()
            .map_err(|e| SleuthError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arena>> {
        self.arena
            .write()
            .map_err(|e| SleuthError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Pick up chunks written to the database by other processes.
    fn sync(&self) -> Result<()> {
        if let Some(persistence) = &self.persistence {
            let mut arena = self.write()?;
            if let Some(current) = persistence.changes()? {
                arena.replace(current)?;
            }
        }
        Ok(())
    }

    /// Whether chunks are written to disk.
    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions()
    }

    /// Number of chunks in the store.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Split `text` into chunks, embed them, and append them under `source`.
    ///
    /// Returns the number of chunks added. Empty text is a no-op.
    #[instrument(skip(self, text), fields(source = %source, chars = text.len()))]
    pub async fn add_document(&self, text: &str, source: &str) -> Result<usize> {
        let pieces = self.chunker.chunk(text);
        if pieces.is_empty() {
            debug!("Nothing to index");
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&pieces).await?;
        if embeddings.len() != pieces.len() {
            return Err(SleuthError::Embedding(format!(
                "Expected {} embeddings, got {}",
                pieces.len(),
                embeddings.len()
            )));
        }

        let entries: Vec<(Chunk, Vec<f32>)> = pieces
            .into_iter()
            .zip(embeddings)
            .map(|(piece, vector)| (Chunk::new(piece, source), vector))
            .collect();
        let added = entries.len();

        let mut arena = self.write()?;
        arena.validate(&entries)?;
        if let Some(persistence) = &self.persistence {
            if let Some(current) = persistence.append(&entries)? {
                debug!("Store changed on disk, resyncing {} chunks", current.len());
                arena.replace(current)?;
            }
        }
        let range = arena.append(entries)?;

        info!("Indexed {} chunks at positions {:?}", added, range);
        Ok(added)
    }

    /// Return up to `k` chunks closest to `query`, nearest first.
    ///
    /// An empty store or `k == 0` returns nothing without embedding the query.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        self.sync()?;
        if self.is_empty()? {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let arena = self.read()?;
        let hits = arena.nearest(&query_embedding, k)?;
        let results: Vec<SearchResult> = hits
            .into_iter()
            .filter_map(|(position, distance)| {
                arena.get(position).map(|chunk| SearchResult {
                    chunk: chunk.clone(),
                    distance,
                })
            })
            .collect();

        debug!("Retrieved {} chunks", results.len());
        Ok(results)
    }

    /// Remove every chunk, in memory and on disk.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<()> {
        let mut arena = self.write()?;
        if let Some(persistence) = &self.persistence {
            persistence.clear()?;
        }
        arena.clear();
        info!("Memory store cleared");
        Ok(())
    }

    /// Distinct sources in first-seen order with their chunk counts.
    pub fn sources(&self) -> Result<Vec<SourceSummary>> {
        self.sync()?;
        let arena = self.read()?;
        let mut summaries: Vec<SourceSummary> = Vec::new();
        for chunk in arena.chunks() {
            match summaries.iter_mut().find(|s| s.source == chunk.metadata.source) {
                Some(summary) => summary.chunk_count += 1,
                None => summaries.push(SourceSummary {
                    source: chunk.metadata.source.clone(),
                    chunk_count: 1,
                }),
            }
        }
        Ok(summaries)
    }

    /// Every chunk's text, in insertion order.
    pub fn all_text(&self) -> Result<Vec<String>> {
        self.sync()?;
        Ok(self.read()?.chunks().iter().map(|c| c.text.clone()).collect())
    }
}
