//! Stitch diff engine
//!
//! LCS-based sequence alignment and the two consumers built on it:
//!
//! - [`LcsTable`]: the (m+1) x (n+1) dynamic-programming length table
//! - [`changed_lines`]: 1-indexed changed line numbers for UI highlighting
//! - [`reconcile_lines`] / [`summarize`]: interleaved unified diff documents
//!
//! Everything here is synchronous, pure, and deterministic; computations for
//! independent files are safe to run in parallel without coordination.

mod lcs;
mod line_diff;
mod unified;

pub use lcs::{split_lines, LcsTable};
pub use line_diff::changed_lines;
pub use unified::{reconcile_lines, summarize, summarize_with_stats, DiffLine, DiffStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
