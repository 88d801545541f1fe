//! Stitch chunking codec
//!
//! Serializes arbitrarily large JSON-shaped payloads into bounded-size
//! pieces for a storage medium with a per-write size ceiling, and
//! transparently reassembles them on read.
//!
//! - [`ChunkedCodec`]: save/load with an inline threshold and batched writes
//! - [`DocumentStore`]: the narrow storage seam; [`MemoryStore`] for tests
//!
//! Round-trip fidelity is the invariant: `load(save(base, large))`
//! reproduces the merged fields exactly whether or not chunking triggered.

mod codec;
mod store;

pub use codec::{ChunkError, ChunkedCodec, CHUNK_THRESHOLD_BYTES, MAX_WRITES_PER_BATCH};
pub use store::{ChunkRecord, DocumentStore, MemoryStore, StoreError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
