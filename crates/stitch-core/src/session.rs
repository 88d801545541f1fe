//! Per-project orchestration session
//!
//! A [`ProjectSession`] is the explicit context object owning one project's
//! live state: file collection, highlight tracking, checkpoints, and the
//! `Idle -> Patching -> Idle/Failed` machine. The snapshot manager mutex is
//! also the mutual-exclusion section around
//! fetch state -> generate -> apply -> persist, so at most one mutation is
//! ever in flight per project.
//!
//! Mutations are transactional: apply in memory, attempt persistence, and
//! only report the committed state on success; on a persistence failure the
//! pre-image is reinstated in memory and re-persisted, so neither a live
//! reader nor a later reopened session ever observes an uncommitted
//! mutation.

use crate::error::EngineError;
use crate::generate::Generator;
use crate::persist::ProjectRepository;
use crate::progress::ProgressSink;
use crate::retry::RetryPolicy;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use stitch_chunk::DocumentStore;
use stitch_diff::summarize;
use stitch_model::{Checkpoint, FileCollection};
use stitch_snapshot::{
    validate_transition, HistoryEntry, ProjectState, RevertReport, SnapshotError, SnapshotManager,
};
use tokio::sync::Mutex;
use uuid::Uuid;

/// What a completed refinement changed
#[derive(Debug, Clone, serde::Serialize)]
pub struct RefineOutcome {
    /// The new live collection
    pub files: FileCollection,
    /// Paths changed by the patch
    pub changed_paths: BTreeSet<String>,
    /// Changed line numbers per path, for highlighting
    pub line_diffs: BTreeMap<String, BTreeSet<usize>>,
    /// Unified diff document against the pre-patch collection
    pub diff_summary: String,
}

/// One project's session: state owner and mutation gate
pub struct ProjectSession<S> {
    project_id: String,
    generator: Arc<dyn Generator>,
    repo: ProjectRepository<S>,
    retry: RetryPolicy,
    // Holding this across the whole mutation is what guarantees at most
    // one in-flight patch-apply per project.
    manager: Mutex<SnapshotManager>,
    state: parking_lot::Mutex<ProjectState>,
}

impl<S: DocumentStore> ProjectSession<S> {
    /// Session seeded with an existing collection (possibly empty)
    #[must_use]
    pub fn new(
        project_id: impl Into<String>,
        generator: Arc<dyn Generator>,
        repo: ProjectRepository<S>,
        retry: RetryPolicy,
        initial_files: FileCollection,
    ) -> Self {
        Self::with_manager(
            project_id,
            generator,
            repo,
            retry,
            SnapshotManager::with_files(initial_files),
        )
    }

    /// Session over a pre-built manager (hydrated from storage)
    #[must_use]
    pub fn with_manager(
        project_id: impl Into<String>,
        generator: Arc<dyn Generator>,
        repo: ProjectRepository<S>,
        retry: RetryPolicy,
        manager: SnapshotManager,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            generator,
            repo,
            retry,
            manager: Mutex::new(manager),
            state: parking_lot::Mutex::new(ProjectState::Idle),
        }
    }

    /// Project identifier
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Current mutation state
    #[must_use]
    pub fn state(&self) -> ProjectState {
        *self.state.lock()
    }

    /// Copy of the live file collection
    pub async fn files(&self) -> FileCollection {
        self.manager.lock().await.files().clone()
    }

    /// Paths changed by the most recent mutation
    pub async fn changed_paths(&self) -> BTreeSet<String> {
        self.manager.lock().await.tracker().changed_paths().clone()
    }

    /// Line-diff map from the most recent mutation
    pub async fn line_diffs(&self) -> BTreeMap<String, BTreeSet<usize>> {
        self.manager.lock().await.tracker().line_diffs().clone()
    }

    /// In-memory checkpoints, newest-first
    pub async fn list_checkpoints(&self) -> Vec<Checkpoint> {
        self.manager.lock().await.list_checkpoints()
    }

    /// Mutation history, oldest-first
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.manager.lock().await.history().to_vec()
    }

    /// Generate the project from scratch (or regenerate over the base)
    ///
    /// Regenerating over a non-empty base checkpoints the pre-regeneration
    /// state first, so the rebuild can be reverted like any other mutation
    /// and the live and persisted checkpoint histories stay in step.
    ///
    /// # Errors
    /// Any generation or persistence failure leaves the previous collection
    /// in place and the session in `Failed`.
    pub async fn initialize(
        &self,
        requirements: &str,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<FileCollection, EngineError> {
        let mut manager = self.manager.lock().await;
        self.begin_mutation()?;

        let pre_image = manager.files().clone();
        let base = if pre_image.is_empty() {
            None
        } else {
            Some(pre_image.clone())
        };

        let generated = self
            .retry
            .run(|| {
                self.generator
                    .generate_project(requirements, base.clone(), Arc::clone(&progress))
            })
            .await;
        let files = match generated {
            Ok(files) => files,
            Err(e) => return Err(self.fail(e)),
        };

        let checkpointed = manager.regenerate(requirements, files.clone()).is_some();
        if let Err(e) = self.persist_mutation(&manager).await {
            if checkpointed {
                self.undo_failed_mutation(&mut manager, pre_image).await;
            } else {
                manager.restore(pre_image);
            }
            return Err(self.fail(e));
        }

        self.transition(ProjectState::Idle)?;
        tracing::info!(project_id = %self.project_id, files = files.len(), "project initialized");
        Ok(files)
    }

    /// Request and apply a model patch for a change request
    ///
    /// Checkpoints the pre-mutation state (labeled with the request),
    /// applies the patch, persists snapshot and checkpoint, and reports
    /// what changed. On any failure the live collection is exactly as it
    /// was before the attempt.
    ///
    /// # Errors
    /// Generation, validation, and persistence failures all move the
    /// session to `Failed` and surface a descriptive error.
    pub async fn refine(
        &self,
        change_request: &str,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<RefineOutcome, EngineError> {
        let mut manager = self.manager.lock().await;
        self.begin_mutation()?;

        let pre_image = manager.files().clone();
        if let Err(e) = ensure_serializable(&pre_image) {
            return Err(self.fail(e));
        }
        let requested = self
            .retry
            .run(|| {
                self.generator.request_patch(
                    change_request,
                    pre_image.clone(),
                    Arc::clone(&progress),
                )
            })
            .await;
        let patch = match requested {
            Ok(patch) => patch,
            Err(e) => return Err(self.fail(e)),
        };

        if let Err(e) = manager.apply_patch(change_request, &patch) {
            return Err(self.fail(e.into()));
        }

        if let Err(e) = self.persist_mutation(&manager).await {
            self.undo_failed_mutation(&mut manager, pre_image).await;
            return Err(self.fail(e));
        }

        let outcome = RefineOutcome {
            files: manager.files().clone(),
            changed_paths: manager.tracker().changed_paths().clone(),
            line_diffs: manager.tracker().line_diffs().clone(),
            diff_summary: summarize(&pre_image, manager.files()),
        };
        self.transition(ProjectState::Idle)?;
        tracing::info!(
            project_id = %self.project_id,
            changed = outcome.changed_paths.len(),
            "refinement applied"
        );
        Ok(outcome)
    }

    /// Manually edit a single file
    ///
    /// Human edits are not chat-driven, so no checkpoint is taken; the
    /// edited path's model-attributed highlight is cleared.
    ///
    /// # Errors
    /// A persistence failure rolls the edit back.
    pub async fn edit_file(
        &self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), EngineError> {
        let mut manager = self.manager.lock().await;
        let pre_image = manager.files().clone();
        manager.edit_file(path, content);

        if let Err(e) = self.repo.persist_snapshot(&self.project_id, manager.files()).await {
            manager.restore(pre_image);
            return Err(e);
        }
        Ok(())
    }

    /// Revert the project to a checkpoint
    ///
    /// The pre-revert state gets its own checkpoint and the report shows
    /// what the revert changed relative to it.
    ///
    /// # Errors
    /// Unknown checkpoints and persistence failures leave the live
    /// collection untouched.
    pub async fn revert_to(&self, checkpoint_id: Uuid) -> Result<RevertReport, EngineError> {
        let mut manager = self.manager.lock().await;
        self.begin_mutation()?;

        let pre_image = manager.files().clone();
        let report = match manager.revert(checkpoint_id) {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e.into())),
        };

        if let Err(e) = self.persist_mutation(&manager).await {
            self.undo_failed_mutation(&mut manager, pre_image).await;
            return Err(self.fail(e));
        }

        self.transition(ProjectState::Idle)?;
        tracing::info!(project_id = %self.project_id, checkpoint = %checkpoint_id, "reverted");
        Ok(report)
    }

    /// Unified diff between a stored checkpoint and the live collection
    ///
    /// # Errors
    /// Fails if the checkpoint does not exist.
    pub async fn diff_against(&self, checkpoint_id: Uuid) -> Result<String, EngineError> {
        let manager = self.manager.lock().await;
        let checkpoint = manager
            .list_checkpoints()
            .into_iter()
            .find(|c| c.id == checkpoint_id)
            .ok_or(SnapshotError::UnknownCheckpoint(checkpoint_id))?;
        Ok(summarize(&checkpoint.files, manager.files()))
    }

    /// Persist the live snapshot plus the newest checkpoint
    async fn persist_mutation(&self, manager: &SnapshotManager) -> Result<(), EngineError> {
        self.repo
            .persist_snapshot(&self.project_id, manager.files())
            .await?;
        if let Some(checkpoint) = manager.list_checkpoints().into_iter().next() {
            self.repo
                .persist_checkpoint(&self.project_id, &checkpoint)
                .await?;
        }
        Ok(())
    }

    /// Roll a checkpointed mutation back after its persistence failed
    ///
    /// Drops the orphaned checkpoint and history entry, reinstates the
    /// pre-image, and re-persists it so storage cannot serve the
    /// rolled-back mutation to a reopened session. The re-persist is best
    /// effort: if the store is still down the original error already
    /// describes the outage.
    async fn undo_failed_mutation(
        &self,
        manager: &mut SnapshotManager,
        pre_image: FileCollection,
    ) {
        manager.rollback_mutation(pre_image);
        if let Err(e) = self
            .repo
            .persist_snapshot(&self.project_id, manager.files())
            .await
        {
            tracing::error!(
                project_id = %self.project_id,
                error = %e,
                "could not re-persist pre-image after failed mutation"
            );
        }
    }

    /// Move into `Patching`, acknowledging a lingering `Failed` first
    fn begin_mutation(&self) -> Result<(), EngineError> {
        if self.state() == ProjectState::Failed {
            self.transition(ProjectState::Idle)?;
        }
        self.transition(ProjectState::Patching)
    }

    /// Record the failure state and hand the error back
    fn fail(&self, err: EngineError) -> EngineError {
        tracing::error!(project_id = %self.project_id, error = %err, "mutation failed");
        if let Err(state_err) = self.transition(ProjectState::Failed) {
            tracing::error!(error = %state_err, "could not enter Failed state");
        }
        err
    }

    fn transition(&self, to: ProjectState) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        validate_transition(*state, to)?;
        *state = to;
        Ok(())
    }
}

/// Prove the request payload serializes before the generation call is made
///
/// Catches bad data at the boundary with an actionable error instead of a
/// confusing mid-request failure.
fn ensure_serializable(files: &FileCollection) -> Result<(), EngineError> {
    serde_json::to_string(files)
        .map(|_| ())
        .map_err(|e| EngineError::NotSerializable(e.to_string()))
}
