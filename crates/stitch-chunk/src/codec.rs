//! Chunking codec for oversized JSON payloads
//!
//! A parent document carries base fields plus either the large fields
//! inline (`is_chunked = false`) or a `chunk_count` marker pointing at
//! separately indexed child records holding fixed-size substrings of the
//! serialized payload. Loading transparently reassembles; a missing chunk
//! or parse failure fails the load rather than returning a half-populated
//! record.

use crate::store::{ChunkRecord, DocumentStore, StoreError};
use serde_json::{Map, Value};

/// Inline-size safety threshold, deliberately well under a 1 MB document
/// ceiling to leave room for base fields and metadata
pub const CHUNK_THRESHOLD_BYTES: usize = 800 * 1024;

/// Maximum chunk writes per committed batch (~8 MB of payload per batch)
pub const MAX_WRITES_PER_BATCH: usize = 10;

/// Marker field: whether large fields were split into child records
const FIELD_IS_CHUNKED: &str = "is_chunked";
/// Marker field: number of child records when chunked
const FIELD_CHUNK_COUNT: &str = "chunk_count";

/// Errors from chunked save/load
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Parent document not found
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// A chunk index expected during reassembly was absent
    #[error("missing chunk {index} of {expected} for document {id}")]
    MissingChunk {
        id: String,
        index: usize,
        expected: usize,
    },

    /// Chunk count marker disagrees with the chunks actually stored
    #[error("chunk count mismatch for document {id}: marker {marked}, stored {stored}")]
    ChunkCountMismatch {
        id: String,
        marked: usize,
        stored: usize,
    },

    /// Reassembled payload failed to parse, or markers were malformed
    #[error("payload corrupt for document {id}: {reason}")]
    Corrupt { id: String, reason: String },

    /// JSON serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Splits oversized payloads across bounded child records
///
/// Threshold and batch limit are configurable for tests; production callers
/// use [`ChunkedCodec::default`] with the module constants.
#[derive(Debug, Clone, Copy)]
pub struct ChunkedCodec {
    threshold: usize,
    batch_limit: usize,
}

impl Default for ChunkedCodec {
    fn default() -> Self {
        Self {
            threshold: CHUNK_THRESHOLD_BYTES,
            batch_limit: MAX_WRITES_PER_BATCH,
        }
    }
}

impl ChunkedCodec {
    /// Codec with explicit threshold and batch limit
    ///
    /// `threshold` is a byte count; chunks never exceed it (they may fall
    /// slightly short to respect UTF-8 boundaries).
    #[must_use]
    pub fn new(threshold: usize, batch_limit: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            batch_limit: batch_limit.max(1),
        }
    }

    /// Persist `base` and `large` fields under `id`
    ///
    /// Serializes `large` as one JSON object; stores it inline when it fits
    /// under the threshold, otherwise as indexed child records written in
    /// bounded batches. Writes land chunks first and the parent markers
    /// after, with stale chunks from a previous save trimmed last: until the
    /// parent flips, a failed save leaves the previous record loadable, and
    /// a shrinking payload cannot leave orphans behind.
    ///
    /// # Errors
    /// Fails on serialization or store errors; nothing is partially merged
    /// on the read side because the markers are written with the parent
    /// document last-known-consistent.
    pub async fn save<S: DocumentStore>(
        &self,
        store: &S,
        id: &str,
        base: Map<String, Value>,
        large: Map<String, Value>,
    ) -> Result<(), ChunkError> {
        let payload = serde_json::to_string(&Value::Object(large.clone()))?;

        let mut parent = base;
        if payload.len() < self.threshold {
            for (key, value) in large {
                parent.insert(key, value);
            }
            parent.insert(FIELD_IS_CHUNKED.into(), Value::Bool(false));
            parent.remove(FIELD_CHUNK_COUNT);
            store.put_document(id, parent).await?;
            store.delete_chunks(id).await?;
            tracing::debug!(id, bytes = payload.len(), "stored payload inline");
            return Ok(());
        }

        let pieces = split_utf8(&payload, self.threshold);
        let chunk_count = pieces.len();
        for batch in chunked_records(&pieces).chunks(self.batch_limit) {
            store.put_chunks(id, batch.to_vec()).await?;
        }

        // Large fields never land on the parent when chunked.
        parent.insert(FIELD_IS_CHUNKED.into(), Value::Bool(true));
        parent.insert(FIELD_CHUNK_COUNT.into(), Value::from(chunk_count));
        store.put_document(id, parent).await?;
        store.delete_chunks_from(id, chunk_count).await?;
        tracing::debug!(id, bytes = payload.len(), chunk_count, "stored payload chunked");
        Ok(())
    }

    /// Load and merge the fields previously saved under `id`
    ///
    /// # Errors
    /// Fails if the parent is missing, any chunk is missing or duplicated,
    /// the marker disagrees with stored chunks, or the reassembled payload
    /// does not parse as a JSON object. A failed load never returns
    /// partially merged data.
    pub async fn load<S: DocumentStore>(
        &self,
        store: &S,
        id: &str,
    ) -> Result<Map<String, Value>, ChunkError> {
        let mut parent = store
            .get_document(id)
            .await?
            .ok_or_else(|| ChunkError::DocumentNotFound(id.to_string()))?;

        let is_chunked = matches!(parent.get(FIELD_IS_CHUNKED), Some(Value::Bool(true)));
        let marked = parent
            .get(FIELD_CHUNK_COUNT)
            .and_then(Value::as_u64)
            .map(|n| n as usize);
        parent.remove(FIELD_IS_CHUNKED);
        parent.remove(FIELD_CHUNK_COUNT);

        if !is_chunked {
            return Ok(parent);
        }

        let marked = marked.ok_or_else(|| ChunkError::Corrupt {
            id: id.to_string(),
            reason: "chunked document has no chunk_count".to_string(),
        })?;

        let mut chunks = store.get_chunks(id).await?;
        if chunks.len() != marked {
            return Err(ChunkError::ChunkCountMismatch {
                id: id.to_string(),
                marked,
                stored: chunks.len(),
            });
        }
        chunks.sort_by_key(|c| c.index);
        for (expected, chunk) in chunks.iter().enumerate() {
            if chunk.index != expected {
                return Err(ChunkError::MissingChunk {
                    id: id.to_string(),
                    index: expected,
                    expected: marked,
                });
            }
        }

        let payload: String = chunks.into_iter().map(|c| c.content).collect();
        let large: Value = serde_json::from_str(&payload)?;
        let Value::Object(large) = large else {
            return Err(ChunkError::Corrupt {
                id: id.to_string(),
                reason: "reassembled payload is not a JSON object".to_string(),
            });
        };

        for (key, value) in large {
            parent.insert(key, value);
        }
        Ok(parent)
    }
}

/// Split on char boundaries with each piece at most `size` bytes
///
/// A piece may exceed `size` only when `size` is smaller than a single
/// character, which cannot happen at production thresholds.
fn split_utf8(s: &str, size: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let mut end = size.min(rest.len());
        while end > 0 && !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            // size is below one char; take the whole char to make progress
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (piece, tail) = rest.split_at(end);
        pieces.push(piece);
        rest = tail;
    }
    pieces
}

fn chunked_records(pieces: &[&str]) -> Vec<ChunkRecord> {
    pieces
        .iter()
        .enumerate()
        .map(|(index, piece)| ChunkRecord {
            index,
            content: (*piece).to_string(),
        })
        .collect()
}
