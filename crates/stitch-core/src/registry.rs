//! Session registry: one live session per project
//!
//! Hands out shared [`ProjectSession`] handles keyed by project id. The
//! first `open` for a project hydrates its snapshot and checkpoint history
//! from storage; subsequent opens return the same session, which is what
//! makes the per-project mutation mutex effective across callers.

use crate::error::EngineError;
use crate::generate::Generator;
use crate::persist::ProjectRepository;
use crate::retry::RetryPolicy;
use crate::session::ProjectSession;
use dashmap::DashMap;
use std::sync::Arc;
use stitch_chunk::DocumentStore;
use stitch_snapshot::SnapshotManager;

/// Shared registry of project sessions over one store and generator
pub struct SessionRegistry<S> {
    generator: Arc<dyn Generator>,
    store: Arc<S>,
    retry: RetryPolicy,
    sessions: DashMap<String, Arc<ProjectSession<S>>>,
}

impl<S: DocumentStore> SessionRegistry<S> {
    /// Registry with the default retry policy
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, store: Arc<S>) -> Self {
        Self::with_retry(generator, store, RetryPolicy::default())
    }

    /// Registry with an explicit retry policy
    #[must_use]
    pub fn with_retry(generator: Arc<dyn Generator>, store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            generator,
            store,
            retry,
            sessions: DashMap::new(),
        }
    }

    /// Open (or return the already-open) session for a project
    ///
    /// A fresh open loads the persisted snapshot and checkpoint history;
    /// a project that was never persisted starts empty.
    ///
    /// # Errors
    /// Fails if hydration from the store fails.
    pub async fn open(&self, project_id: &str) -> Result<Arc<ProjectSession<S>>, EngineError> {
        if let Some(session) = self.sessions.get(project_id) {
            return Ok(Arc::clone(&session));
        }

        let repo = ProjectRepository::new(Arc::clone(&self.store));
        let files = repo.read_snapshot(project_id).await?.unwrap_or_default();
        let mut checkpoints = repo.list_checkpoints(project_id).await?;
        checkpoints.reverse(); // stored newest-first, hydration wants oldest-first

        let mut manager = SnapshotManager::with_files(files);
        manager.hydrate_checkpoints(checkpoints);

        let session = Arc::new(ProjectSession::with_manager(
            project_id,
            Arc::clone(&self.generator),
            repo,
            self.retry,
            manager,
        ));

        // another caller may have hydrated concurrently; first insert wins
        let entry = self
            .sessions
            .entry(project_id.to_string())
            .or_insert(session);
        Ok(Arc::clone(&entry))
    }

    /// Drop a project's in-memory session (persisted state is untouched)
    pub fn close(&self, project_id: &str) {
        self.sessions.remove(project_id);
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether any session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::MockGenerator;
    use crate::progress::NullProgress;
    use pretty_assertions::assert_eq;
    use stitch_chunk::MemoryStore;
    use stitch_model::{FileCollection, FileRecord, PatchOp};

    fn registry_with(generator: MockGenerator) -> SessionRegistry<MemoryStore> {
        SessionRegistry::with_retry(
            Arc::new(generator),
            Arc::new(MemoryStore::new()),
            RetryPolicy::none(),
        )
    }

    #[tokio::test]
    async fn open_returns_same_session() {
        let registry = registry_with(MockGenerator::new());
        let a = registry.open("p1").await.unwrap();
        let b = registry.open("p1").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn distinct_projects_get_distinct_sessions() {
        let registry = registry_with(MockGenerator::new());
        let a = registry.open("p1").await.unwrap();
        let b = registry.open("p2").await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn unpersisted_project_opens_empty() {
        let registry = registry_with(MockGenerator::new());
        let session = registry.open("fresh").await.unwrap();
        assert!(session.files().await.is_empty());
        assert!(session.list_checkpoints().await.is_empty());
    }

    #[tokio::test]
    async fn reopen_hydrates_snapshot_and_checkpoints() {
        let mut generator = MockGenerator::new();
        generator.expect_request_patch().returning(|_, _, _| {
            Ok([PatchOp::Update {
                path: "a".into(),
                content: "v2".into(),
            }]
            .into_iter()
            .collect())
        });

        let store = Arc::new(MemoryStore::new());
        let registry = SessionRegistry::with_retry(
            Arc::new(generator),
            Arc::clone(&store),
            RetryPolicy::none(),
        );

        // seed persisted state through a session, then drop it
        {
            let files: FileCollection = [FileRecord::new("a", "v1")].into_iter().collect();
            let repo = ProjectRepository::new(Arc::clone(&store));
            repo.persist_snapshot("p1", &files).await.unwrap();

            let session = registry.open("p1").await.unwrap();
            session
                .refine("bump", Arc::new(NullProgress))
                .await
                .unwrap();
            registry.close("p1");
        }

        let session = registry.open("p1").await.unwrap();
        assert_eq!(session.files().await.get("a"), Some("v2"));

        let checkpoints = session.list_checkpoints().await;
        assert_eq!(checkpoints.len(), 1);
        assert_eq!(checkpoints[0].message, "bump");
        assert_eq!(checkpoints[0].files.get("a"), Some("v1"));

        // revert works against the hydrated history
        let report = session.revert_to(checkpoints[0].id).await.unwrap();
        assert_eq!(report.checkpoint_id, checkpoints[0].id);
        assert_eq!(session.files().await.get("a"), Some("v1"));
    }
}
