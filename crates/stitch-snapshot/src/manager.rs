//! Snapshot manager: sole owner of the live file collection
//!
//! All mutation of a project's files goes through this type: model patch
//! application, manual single-file edits, and checkpoint reverts. Each
//! mutating chat-driven change checkpoints the pre-mutation state first,
//! labeled with the request that caused it; on any failure the live
//! collection is left untouched.

use crate::store::CheckpointStore;
use crate::tracker::ChangeTracker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use stitch_model::{Checkpoint, FileCollection, Patch};
use uuid::Uuid;

/// Errors from snapshot lifecycle operations
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// No checkpoint with the given id
    #[error("unknown checkpoint: {0}")]
    UnknownCheckpoint(Uuid),

    /// Patch validation or application failed
    #[error(transparent)]
    Reconcile(#[from] stitch_patch::ReconcileError),
}

/// One entry in the project's mutation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the mutation completed
    pub at: DateTime<Utc>,
    /// Human-readable description (the request, or the revert action)
    pub message: String,
}

/// What a revert changed, computed against the pre-revert collection
///
/// Returned so the UI can show the effect of the revert; the same data is
/// installed into the change tracker.
#[derive(Debug, Clone)]
pub struct RevertReport {
    /// Checkpoint the project was reverted to
    pub checkpoint_id: Uuid,
    /// Paths that differ from the pre-revert collection
    pub changed_paths: BTreeSet<String>,
    /// Line diffs for those paths, keyed by path
    pub line_diffs: BTreeMap<String, BTreeSet<usize>>,
}

/// Owner of one project's live snapshot, checkpoints, and highlight state
#[derive(Debug, Default)]
pub struct SnapshotManager {
    files: FileCollection,
    tracker: ChangeTracker,
    checkpoints: CheckpointStore,
    history: Vec<HistoryEntry>,
}

impl SnapshotManager {
    /// Start from an empty project
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an initial generation result
    #[must_use]
    pub fn with_files(files: FileCollection) -> Self {
        Self {
            files,
            ..Self::default()
        }
    }

    /// The live file collection
    #[must_use]
    pub fn files(&self) -> &FileCollection {
        &self.files
    }

    /// Current highlight state
    #[must_use]
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Mutation history, oldest-first
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Checkpoints, newest-first
    #[must_use]
    pub fn list_checkpoints(&self) -> Vec<Checkpoint> {
        self.checkpoints.list()
    }

    /// Seed the checkpoint store from persisted history
    ///
    /// Expects `checkpoints` oldest-first so the in-memory ordering matches
    /// a store that was never unloaded.
    pub fn hydrate_checkpoints(&mut self, checkpoints: Vec<Checkpoint>) {
        for checkpoint in checkpoints {
            self.checkpoints.insert(checkpoint);
        }
    }

    /// Checkpoint the current state without mutating it
    ///
    /// Used before risky operations; the stored copy is deep and immutable.
    pub fn create_checkpoint(&self, message: impl Into<String>) -> Checkpoint {
        self.checkpoints.create(message, &self.files)
    }

    /// Apply a model-issued patch, checkpointing the pre-mutation state
    ///
    /// The checkpoint is labeled with `message` (the change request).
    /// Validation runs before the checkpoint is created, so a rejected
    /// patch leaves no checkpoint behind for a mutation that never
    /// happened.
    ///
    /// # Errors
    /// Returns [`SnapshotError::Reconcile`] if the patch is malformed; the
    /// live collection is untouched in that case.
    pub fn apply_patch(
        &mut self,
        message: impl Into<String>,
        patch: &Patch,
    ) -> Result<&FileCollection, SnapshotError> {
        let message = message.into();
        stitch_patch::validate(patch)?;

        self.checkpoints.create(message.clone(), &self.files);
        let next = stitch_patch::apply(&self.files, patch)?;

        self.tracker.record_mutation(&self.files, &next);
        self.files = next;
        self.history.push(HistoryEntry {
            at: Utc::now(),
            message,
        });
        tracing::info!(files = self.files.len(), "patch applied");
        Ok(&self.files)
    }

    /// Manually edit a single file (upsert)
    ///
    /// Does not checkpoint; human edits are not chat-driven mutations. The
    /// edited path's model-attributed line highlight is cleared.
    pub fn edit_file(&mut self, path: impl Into<String>, content: impl Into<String>) {
        let path = path.into();
        self.files.upsert(path.clone(), content);
        self.tracker.record_manual_edit(&path);
    }

    /// Replace the live collection with a freshly generated one
    ///
    /// Regenerating over a non-empty project is a mutation like any other:
    /// the pre-regeneration state is checkpointed under `message`, tracking
    /// is recomputed against it, and a history entry is appended. Generating
    /// from an empty project records nothing; there is no prior state worth
    /// restoring. Existing checkpoints always survive the replacement.
    pub fn regenerate(
        &mut self,
        message: impl Into<String>,
        files: FileCollection,
    ) -> Option<Checkpoint> {
        if self.files.is_empty() {
            self.tracker.clear();
            self.files = files;
            return None;
        }

        let message = message.into();
        let checkpoint = self.checkpoints.create(message.clone(), &self.files);
        self.tracker.record_mutation(&self.files, &files);
        self.files = files;
        self.history.push(HistoryEntry {
            at: Utc::now(),
            message,
        });
        Some(checkpoint)
    }

    /// Revert the live collection to a stored checkpoint
    ///
    /// Checkpoints the pre-revert state, computes what the revert changes
    /// against that state, replaces the live collection wholesale, and
    /// appends a history entry. Stored checkpoints are never altered.
    ///
    /// # Errors
    /// Returns [`SnapshotError::UnknownCheckpoint`] if `id` does not exist;
    /// the live collection is untouched in that case.
    pub fn revert(&mut self, id: Uuid) -> Result<RevertReport, SnapshotError> {
        let checkpoint = self
            .checkpoints
            .get(id)
            .ok_or(SnapshotError::UnknownCheckpoint(id))?;

        let label = format!("Reverted to checkpoint: {}", checkpoint.message);
        self.checkpoints.create(label.clone(), &self.files);

        self.tracker.record_mutation(&self.files, &checkpoint.files);
        let report = RevertReport {
            checkpoint_id: id,
            changed_paths: self.tracker.changed_paths().clone(),
            line_diffs: self.tracker.line_diffs().clone(),
        };

        self.files = checkpoint.files;
        self.history.push(HistoryEntry {
            at: Utc::now(),
            message: label,
        });
        tracing::info!(checkpoint = %id, "reverted to checkpoint");
        Ok(report)
    }

    /// Restore a previously captured pre-image without checkpointing
    ///
    /// Rollback hook for transactional apply-then-persist wrappers: when
    /// persistence fails the caller reinstates the pre-image and the
    /// downstream state never observes the uncommitted mutation.
    pub fn restore(&mut self, pre_image: FileCollection) {
        self.files = pre_image;
        self.tracker.clear();
    }

    /// Undo a checkpointed mutation whose persistence failed
    ///
    /// Reinstates the pre-image and drops the checkpoint and history entry
    /// recorded for the failed mutation, so in-memory history never
    /// describes a change that was rolled back.
    pub fn rollback_mutation(&mut self, pre_image: FileCollection) {
        self.files = pre_image;
        self.tracker.clear();
        self.checkpoints.discard_newest();
        self.history.pop();
    }
}
