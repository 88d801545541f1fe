//! Checkpoints: immutable, labeled project snapshots
//!
//! A checkpoint captures the complete pre-mutation file collection together
//! with the human-readable request that caused the upcoming mutation. Stored
//! checkpoints are never altered afterwards; reverting replaces the live
//! collection wholesale and records its own history entry.

use crate::file::FileCollection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable, timestamped snapshot of a project's file collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Opaque checkpoint id
    pub id: Uuid,
    /// The request that triggered the mutation this checkpoint precedes
    pub message: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Deep copy of the pre-mutation file collection
    pub files: FileCollection,
}

impl Checkpoint {
    /// Create a checkpoint from a deep copy of `files`
    #[must_use]
    pub fn new(message: impl Into<String>, files: FileCollection) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            created_at: Utc::now(),
            files,
        }
    }
}
