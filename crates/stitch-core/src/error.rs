//! Error taxonomy for the orchestration layer
//!
//! Groups every failure the engine can surface:
//! - validation errors fail the current operation and leave state untouched
//! - transient resource errors are the only automatically retried class
//! - oversized-input errors are non-retriable and surfaced immediately
//! - storage errors never yield partially merged data
//!
//! No function here or below swallows an error and returns a
//! partially-correct result.

use std::time::Duration;
use stitch_chunk::ChunkError;
use stitch_patch::ReconcileError;
use stitch_snapshot::{SnapshotError, StateError};

/// Top-level engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed input detected before any state changed
    #[error("validation failed: {0}")]
    Validation(String),

    /// Patch validation or application failed
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Snapshot lifecycle failure (unknown checkpoint, reconcile)
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Illegal project state transition
    #[error(transparent)]
    State(#[from] StateError),

    /// Generation collaborator returned unparseable output
    #[error("generation output malformed: {0}")]
    MalformedOutput(String),

    /// Generation collaborator transport failure
    #[error("generation transport error: {0}")]
    Transport(String),

    /// Rate limited or quota exhausted; retried with backoff
    #[error("generation collaborator rate limited")]
    RateLimited {
        /// Server-provided hint for when to retry
        retry_after: Option<Duration>,
    },

    /// Input exceeds the generation collaborator's limits; never retried
    #[error("input too large for generation collaborator: {0}")]
    InputTooLarge(String),

    /// Request payload could not be serialized (circular or invalid data)
    #[error("request not serializable: {0}")]
    NotSerializable(String),

    /// Chunked storage failure
    #[error(transparent)]
    Storage(#[from] ChunkError),

    /// JSON (de)serialization failure at a persistence boundary
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The bounded retry budget ran out
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Attempts consumed, including the first
        attempts: u32,
        /// The final transient error
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Whether the bounded automatic retry applies
    ///
    /// Only transient resource exhaustion qualifies; validation, oversized
    /// input, malformed output, and storage failures are surfaced
    /// immediately for the caller to retry manually.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-provided retry delay hint, if any
    #[inline]
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}
