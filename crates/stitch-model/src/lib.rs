//! Stitch data model
//!
//! Shared types for the patch-reconciliation and diff engine:
//!
//! - [`FileRecord`] / [`FileCollection`]: one complete project snapshot
//! - [`Patch`] / [`PatchOp`]: ordered add/update/delete operations
//! - [`Checkpoint`]: immutable, labeled snapshot taken before a mutation
//! - [`ContentHash`]: SHA-256 content addressing for unchanged-detection
//!
//! All types are plain data: serde-serializable, deeply cloneable, and free
//! of interior mutability. Ownership of the *live* collection belongs to the
//! snapshot manager in `stitch-snapshot`.

mod checkpoint;
mod file;
mod hash;
mod patch;

pub use checkpoint::Checkpoint;
pub use file::{FileCollection, FileRecord};
pub use hash::{ContentHash, HashError};
pub use patch::{Patch, PatchOp};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
