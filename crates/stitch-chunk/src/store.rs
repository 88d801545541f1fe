//! Document store abstraction
//!
//! Narrow interface over a storage medium whose individual write unit has a
//! hard size ceiling (a Firestore-style document database, for example). The
//! codec in this crate is the only intended caller; query semantics beyond
//! keyed get/put are deliberately absent.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// One child chunk of an oversized payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Position within the reassembly order, `0..chunk_count`
    pub index: usize,
    /// Substring of the serialized payload
    pub content: String,
}

/// Errors from the backing store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend-specific failure (transport, permission, quota)
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Keyed document storage with separately indexed chunk children
///
/// `put_chunks` receives one already-bounded batch at a time; implementations
/// commit each call as a unit and must not merge batches, since the caller
/// sizes batches to stay under the medium's per-transaction limits.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write (replace) the parent document at `id`
    async fn put_document(&self, id: &str, fields: Map<String, Value>) -> Result<(), StoreError>;

    /// Read the parent document at `id`
    async fn get_document(&self, id: &str) -> Result<Option<Map<String, Value>>, StoreError>;

    /// Write one batch of chunk children under `id`
    ///
    /// Chunks are keyed by index: a record at an index that already exists
    /// replaces it, so a resave overwrites in place.
    async fn put_chunks(&self, id: &str, batch: Vec<ChunkRecord>) -> Result<(), StoreError>;

    /// All chunk children under `id`, in unspecified order
    async fn get_chunks(&self, id: &str) -> Result<Vec<ChunkRecord>, StoreError>;

    /// Remove all chunk children under `id`
    async fn delete_chunks(&self, id: &str) -> Result<(), StoreError>;

    /// Remove chunk children under `id` with `index >= start`
    async fn delete_chunks_from(&self, id: &str, start: usize) -> Result<(), StoreError>;
}

/// In-memory [`DocumentStore`] for tests and local runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<String, Map<String, Value>>,
    chunks: DashMap<String, Vec<ChunkRecord>>,
    batch_commits: AtomicUsize,
    fail_next_write: AtomicBool,
    fail_write_to: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `put_chunks` batches committed so far
    #[must_use]
    pub fn batch_commits(&self) -> usize {
        self.batch_commits.load(Ordering::Relaxed)
    }

    /// Number of chunk children currently stored under `id`
    #[must_use]
    pub fn chunk_count(&self, id: &str) -> usize {
        self.chunks.get(id).map_or(0, |c| c.len())
    }

    /// Make the next write fail with a backend error (failure injection)
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Make the next parent-document write to `id` fail (failure injection)
    pub fn fail_next_write_to(&self, id: impl Into<String>) {
        *self.fail_write_to.lock() = Some(id.into());
    }

    fn take_injected_failure(&self, id: &str) -> Result<(), StoreError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected write failure".into()));
        }
        let mut target = self.fail_write_to.lock();
        if target.as_deref() == Some(id) {
            *target = None;
            return Err(StoreError::Backend(format!(
                "injected write failure for {id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put_document(&self, id: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.take_injected_failure(id)?;
        self.documents.insert(id.to_string(), fields);
        Ok(())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        Ok(self.documents.get(id).map(|d| d.clone()))
    }

    async fn put_chunks(&self, id: &str, batch: Vec<ChunkRecord>) -> Result<(), StoreError> {
        self.batch_commits.fetch_add(1, Ordering::Relaxed);
        let mut stored = self.chunks.entry(id.to_string()).or_default();
        for record in batch {
            match stored.iter_mut().find(|c| c.index == record.index) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        Ok(())
    }

    async fn get_chunks(&self, id: &str) -> Result<Vec<ChunkRecord>, StoreError> {
        Ok(self.chunks.get(id).map(|c| c.clone()).unwrap_or_default())
    }

    async fn delete_chunks(&self, id: &str) -> Result<(), StoreError> {
        self.chunks.remove(id);
        Ok(())
    }

    async fn delete_chunks_from(&self, id: &str, start: usize) -> Result<(), StoreError> {
        if let Some(mut stored) = self.chunks.get_mut(id) {
            stored.retain(|c| c.index < start);
        }
        Ok(())
    }
}
