//! Stitch orchestration layer
//!
//! Drives the full lifecycle of a model-generated project: generation
//! through the [`Generator`] seam, patch reconciliation and checkpointing
//! via the snapshot manager, and chunked persistence through a
//! [`DocumentStore`].
//!
//! Entry points:
//! - [`SessionRegistry`]: one shared [`ProjectSession`] per project id
//! - [`ProjectSession`]: initialize / refine / edit / revert / diff, with
//!   per-project mutual exclusion and transactional rollback
//! - [`RetryPolicy`]: bounded backoff for transient generation failures
//!
//! [`DocumentStore`]: stitch_chunk::DocumentStore

mod error;
mod generate;
mod persist;
mod progress;
mod registry;
mod retry;
mod session;

pub use error::EngineError;
pub use generate::{parse_patch_reply, parse_project_reply, Generator};
pub use persist::ProjectRepository;
pub use progress::{NullProgress, ProgressSink, Throttled, DEFAULT_PROGRESS_INTERVAL};
pub use registry::SessionRegistry;
pub use retry::RetryPolicy;
pub use session::{ProjectSession, RefineOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
