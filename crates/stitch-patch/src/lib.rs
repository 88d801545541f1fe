//! Stitch patch reconciler
//!
//! Merges a sparse set of model-issued add/update/delete operations into a
//! full, consistent project snapshot. See [`apply`].

mod reconcile;

pub use reconcile::{apply, validate, ReconcileError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
