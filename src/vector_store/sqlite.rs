//! SQLite persistence for the memory store.
//!
//! Every chunk row carries its text, source and embedding together, so the
//! index and the chunk list cannot drift apart on disk. Writes happen in a
//! single transaction per add or clear.
//!
//! Several processes may share one database. Positions are assigned by the
//! database inside the write transaction, and a generation counter in
//! `store_meta` is bumped by every write so a process can tell when its
//! in-memory copy is stale.

use super::{Chunk, ChunkMetadata};
use crate::error::{Result, SleuthError};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    position INTEGER PRIMARY KEY,
    text TEXT NOT NULL,
    source TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// How long a writer waits for another process's transaction.
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

type Entries = Vec<(Chunk, Vec<f32>)>;

/// Durable copy of the chunk arena.
pub(super) struct SqlitePersistence {
    conn: Mutex<Connection>,
    /// Generation the caller's arena was last synced to.
    generation: AtomicI64,
}

impl SqlitePersistence {
    /// Open (or create) the database at `path` for vectors of `dimensions`.
    #[instrument(skip_all)]
    pub(super) fn open(path: &Path, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let persistence = Self::init(conn, dimensions)?;

        info!("Opened memory store at {:?}", path);
        Ok(persistence)
    }

    /// In-memory database, used by tests that exercise the SQL path.
    #[cfg(test)]
    pub(super) fn in_memory(dimensions: usize) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, dimensions)
    }

    fn init(conn: Connection, dimensions: usize) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = 'dimensions'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(value) if value != dimensions.to_string() => {
                return Err(SleuthError::VectorStore(format!(
                    "Store was built with {} dimensions, embedder produces {}",
                    value, dimensions
                )));
            }
            Some(_) => {}
            None => {
                conn.execute(
                    "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('dimensions', ?1)",
                    params![dimensions.to_string()],
                )?;
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            generation: AtomicI64::new(-1),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SleuthError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Load every persisted chunk in position order and mark the caller synced.
    pub(super) fn load(&self) -> Result<Entries> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let generation = read_generation(&tx)?;
        let entries = load_rows(&tx)?;
        tx.commit()?;

        self.generation.store(generation, Ordering::SeqCst);
        debug!("Loaded {} persisted chunks", entries.len());
        Ok(entries)
    }

    /// Full contents if another writer changed the database since the last sync.
    pub(super) fn changes(&self) -> Result<Option<Entries>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let generation = read_generation(&tx)?;
        if generation == self.generation.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let entries = load_rows(&tx)?;
        tx.commit()?;
        self.generation.store(generation, Ordering::SeqCst);
        debug!("Resynced {} chunks written elsewhere", entries.len());
        Ok(Some(entries))
    }

    /// Persist a batch after the last stored position.
    ///
    /// If another writer got there first, returns the database contents as
    /// they were before this batch so the caller can resync.
    pub(super) fn append(&self, entries: &[(Chunk, Vec<f32>)]) -> Result<Option<Entries>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let generation = read_generation(&tx)?;
        let stale = if generation != self.generation.load(Ordering::SeqCst) {
            Some(load_rows(&tx)?)
        } else {
            None
        };

        let start: i64 = tx.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM chunks",
            [],
            |row| row.get(0),
        )?;

        for (offset, (chunk, embedding)) in entries.iter().enumerate() {
            tx.execute(
                "INSERT INTO chunks (position, text, source, embedding) VALUES (?1, ?2, ?3, ?4)",
                params![
                    start + offset as i64,
                    chunk.text,
                    chunk.metadata.source,
                    embedding_to_bytes(embedding),
                ],
            )?;
        }

        let next = write_generation(&tx, generation)?;
        tx.commit()?;
        self.generation.store(next, Ordering::SeqCst);

        debug!("Persisted {} chunks at position {}", entries.len(), start);
        Ok(stale)
    }

    /// Remove every persisted chunk.
    pub(super) fn clear(&self) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let generation = read_generation(&tx)?;
        let deleted = tx.execute("DELETE FROM chunks", [])?;
        let next = write_generation(&tx, generation)?;
        tx.commit()?;

        self.generation.store(next, Ordering::SeqCst);
        info!("Deleted {} persisted chunks", deleted);
        Ok(())
    }
}

fn read_generation(conn: &Connection) -> Result<i64> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'generation'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

fn write_generation(conn: &Connection, current: i64) -> Result<i64> {
    let next = current + 1;
    conn.execute(
        "INSERT INTO store_meta (key, value) VALUES ('generation', ?1)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![next.to_string()],
    )?;
    Ok(next)
}

fn load_rows(conn: &Connection) -> Result<Entries> {
    let mut stmt = conn.prepare("SELECT text, source, embedding FROM chunks ORDER BY position")?;

    let rows = stmt.query_map([], |row| {
        let text: String = row.get(0)?;
        let source: String = row.get(1)?;
        let bytes: Vec<u8> = row.get(2)?;
        Ok((
            Chunk {
                text,
                metadata: ChunkMetadata { source },
            },
            bytes_to_embedding(&bytes),
        ))
    })?;

    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Serialize embedding to little-endian bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding from little-endian bytes.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(text: &str, source: &str, v: Vec<f32>) -> (Chunk, Vec<f32>) {
        (Chunk::new(text, source), v)
    }

    #[test]
    fn test_embedding_bytes() {
        let v = vec![0.25_f32, -1.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)), v);
    }

    #[test]
    fn test_append_then_load_in_order() {
        let db = SqlitePersistence::in_memory(2).unwrap();
        db.load().unwrap();
        db.append(&[row("first", "a", vec![1.0, 0.0]), row("second", "b", vec![0.0, 1.0])])
            .unwrap();
        db.append(&[row("third", "a", vec![1.0, 1.0])]).unwrap();

        let loaded = db.load().unwrap();
        let texts: Vec<&str> = loaded.iter().map(|(c, _)| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(loaded[1].0.metadata.source, "b");
        assert_eq!(loaded[2].1, vec![1.0, 1.0]);
    }

    #[test]
    fn test_own_writes_are_not_reported_as_changes() {
        let db = SqlitePersistence::in_memory(1).unwrap();
        db.load().unwrap();
        assert!(db.append(&[row("x", "s", vec![0.0])]).unwrap().is_none());
        assert!(db.changes().unwrap().is_none());
        db.clear().unwrap();
        assert!(db.changes().unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_rows() {
        let db = SqlitePersistence::in_memory(1).unwrap();
        db.load().unwrap();
        db.append(&[row("x", "s", vec![0.0])]).unwrap();
        db.clear().unwrap();
        assert!(db.load().unwrap().is_empty());
    }

    #[test]
    fn test_second_writer_appends_after_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        let a = SqlitePersistence::open(&path, 1).unwrap();
        let b = SqlitePersistence::open(&path, 1).unwrap();
        a.load().unwrap();
        b.load().unwrap();

        assert!(b.append(&[row("from b", "b", vec![1.0])]).unwrap().is_none());

        let stale = a.append(&[row("from a", "a", vec![2.0])]).unwrap().unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].0.text, "from b");

        let texts: Vec<String> = b.changes().unwrap().unwrap().into_iter().map(|(c, _)| c.text).collect();
        assert_eq!(texts, vec!["from b", "from a"]);
    }

    #[test]
    fn test_dimension_mismatch_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.db");
        SqlitePersistence::open(&path, 384).unwrap();

        let err = SqlitePersistence::open(&path, 1536).err().unwrap();
        assert!(matches!(err, SleuthError::VectorStore(_)));
    }
}
