//! In-memory checkpoint storage
//!
//! Checkpoints are immutable once created: the store hands out deep copies
//! and never exposes interior references, so mutating the live collection
//! after a checkpoint is created can never alter stored history.

use parking_lot::RwLock;
use stitch_model::{Checkpoint, FileCollection};
use uuid::Uuid;

/// Ordered checkpoint storage for one project
///
/// Internally append-ordered; [`CheckpointStore::list`] returns newest-first
/// for display.
#[derive(Debug, Default)]
pub struct CheckpointStore {
    inner: RwLock<Vec<Checkpoint>>,
}

impl CheckpointStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a checkpoint from a deep copy of `files`
    ///
    /// Returns a copy of the stored checkpoint. Does not block concurrent
    /// readers beyond the brief append.
    pub fn create(&self, message: impl Into<String>, files: &FileCollection) -> Checkpoint {
        let checkpoint = Checkpoint::new(message, files.clone());
        tracing::debug!(id = %checkpoint.id, message = %checkpoint.message, "created checkpoint");
        self.inner.write().push(checkpoint.clone());
        checkpoint
    }

    /// Insert an already-built checkpoint (hydration from storage)
    ///
    /// Callers must insert in creation order so listing stays consistent.
    pub fn insert(&self, checkpoint: Checkpoint) {
        self.inner.write().push(checkpoint);
    }

    /// Drop and return the most recently stored checkpoint
    ///
    /// Rollback hook for a mutation whose persistence failed.
    pub fn discard_newest(&self) -> Option<Checkpoint> {
        self.inner.write().pop()
    }

    /// All checkpoints, newest-first
    #[must_use]
    pub fn list(&self) -> Vec<Checkpoint> {
        let guard = self.inner.read();
        guard.iter().rev().cloned().collect()
    }

    /// Look up a checkpoint by id
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Checkpoint> {
        self.inner.read().iter().find(|c| c.id == id).cloned()
    }

    /// Number of stored checkpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
