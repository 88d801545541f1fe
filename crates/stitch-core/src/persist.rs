//! Persistence collaborator built on the chunking codec
//!
//! Stores one snapshot document and one checkpoint-list document per
//! project, hiding the storage medium's per-write size ceiling from
//! callers. File collections routinely exceed document limits, so both
//! documents route their large fields through [`ChunkedCodec`].

use crate::error::EngineError;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use stitch_chunk::{ChunkError, ChunkedCodec, DocumentStore};
use stitch_model::{Checkpoint, FileCollection};

fn snapshot_doc(project_id: &str) -> String {
    format!("{project_id}/snapshot")
}

fn checkpoints_doc(project_id: &str) -> String {
    format!("{project_id}/checkpoints")
}

/// Snapshot and checkpoint persistence for all projects in one store
#[derive(Debug)]
pub struct ProjectRepository<S> {
    store: Arc<S>,
    codec: ChunkedCodec,
}

impl<S: DocumentStore> ProjectRepository<S> {
    /// Repository with the production chunking thresholds
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            codec: ChunkedCodec::default(),
        }
    }

    /// Repository with an explicit codec (tests use tiny thresholds)
    #[must_use]
    pub fn with_codec(store: Arc<S>, codec: ChunkedCodec) -> Self {
        Self { store, codec }
    }

    /// Write the live file collection for a project
    ///
    /// # Errors
    /// Surfaces serialization and store failures; nothing is retried here.
    pub async fn persist_snapshot(
        &self,
        project_id: &str,
        files: &FileCollection,
    ) -> Result<(), EngineError> {
        let mut base = Map::new();
        base.insert("project_id".into(), Value::String(project_id.to_string()));
        base.insert(
            "updated_at".into(),
            Value::String(Utc::now().to_rfc3339()),
        );
        base.insert(
            "files_digest".into(),
            Value::String(files.digest().to_string()),
        );

        let mut large = Map::new();
        large.insert("files".into(), serde_json::to_value(files)?);

        self.codec
            .save(self.store.as_ref(), &snapshot_doc(project_id), base, large)
            .await?;
        tracing::debug!(project_id, files = files.len(), "persisted snapshot");
        Ok(())
    }

    /// Read the live file collection, `None` if never persisted
    ///
    /// # Errors
    /// A missing chunk or corrupt payload fails the read; it never returns
    /// a partially populated collection.
    pub async fn read_snapshot(
        &self,
        project_id: &str,
    ) -> Result<Option<FileCollection>, EngineError> {
        let fields = match self
            .codec
            .load(self.store.as_ref(), &snapshot_doc(project_id))
            .await
        {
            Ok(fields) => fields,
            Err(ChunkError::DocumentNotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let files: FileCollection = match fields.get("files") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => return Ok(None),
        };

        // stored digest guards against a reassembly bug serving wrong bytes
        if let Some(Value::String(stored)) = fields.get("files_digest") {
            if *stored != files.digest().to_string() {
                return Err(EngineError::Validation(format!(
                    "snapshot integrity check failed for {project_id}: digest mismatch"
                )));
            }
        }
        Ok(Some(files))
    }

    /// Append a checkpoint to the project's stored history
    ///
    /// # Errors
    /// Fails on storage or serialization errors; the existing stored list
    /// is left as it was.
    pub async fn persist_checkpoint(
        &self,
        project_id: &str,
        checkpoint: &Checkpoint,
    ) -> Result<(), EngineError> {
        let mut checkpoints = self.list_checkpoints(project_id).await?;
        // re-persisting after a partial failure must not duplicate
        checkpoints.retain(|c| c.id != checkpoint.id);
        checkpoints.push(checkpoint.clone());
        checkpoints.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut base = Map::new();
        base.insert("project_id".into(), Value::String(project_id.to_string()));

        let mut large = Map::new();
        large.insert("checkpoints".into(), serde_json::to_value(&checkpoints)?);

        self.codec
            .save(
                self.store.as_ref(),
                &checkpoints_doc(project_id),
                base,
                large,
            )
            .await?;
        tracing::debug!(project_id, checkpoint = %checkpoint.id, "persisted checkpoint");
        Ok(())
    }

    /// Stored checkpoints, newest-first
    ///
    /// # Errors
    /// Fails on storage or deserialization errors.
    pub async fn list_checkpoints(
        &self,
        project_id: &str,
    ) -> Result<Vec<Checkpoint>, EngineError> {
        let fields = match self
            .codec
            .load(self.store.as_ref(), &checkpoints_doc(project_id))
            .await
        {
            Ok(fields) => fields,
            Err(ChunkError::DocumentNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut checkpoints: Vec<Checkpoint> = match fields.get("checkpoints") {
            Some(value) => serde_json::from_value(value.clone())?,
            None => Vec::new(),
        };
        checkpoints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(checkpoints)
    }
}
