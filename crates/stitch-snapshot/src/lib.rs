//! Stitch snapshot lifecycle
//!
//! Owns project file-set versions:
//!
//! - [`CheckpointStore`]: immutable, labeled snapshots, newest-first listing
//! - [`ChangeTracker`]: Changed-Path Set and Line-Diff Map recomputation
//! - [`SnapshotManager`]: the sole owner of the live [`FileCollection`],
//!   through which every mutation flows
//! - [`ProjectState`]: the per-project `Idle -> Patching -> Idle/Failed`
//!   machine
//!
//! [`FileCollection`]: stitch_model::FileCollection

mod manager;
mod state;
mod store;
mod tracker;

pub use manager::{HistoryEntry, RevertReport, SnapshotError, SnapshotManager};
pub use state::{allowed_transitions, validate_transition, ProjectState, StateError};
pub use store::CheckpointStore;
pub use tracker::ChangeTracker;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
