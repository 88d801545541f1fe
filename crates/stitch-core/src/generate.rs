//! Generation collaborator seam
//!
//! The engine never talks to a concrete model API; it consumes this trait.
//! Implementations stream partial text into the provided sink for user
//! feedback and return either a full project or a sparse patch. Both calls
//! may take a long time and are subject to the retry policy in
//! [`crate::retry`].

use crate::error::EngineError;
use crate::progress::ProgressSink;
use async_trait::async_trait;
use std::sync::Arc;
use stitch_model::{FileCollection, Patch};

/// Model-backed project generation and refinement
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a complete project from free-form requirements
    ///
    /// `base_files` seeds the generation when rebuilding an existing
    /// project. Partial output goes to `progress`; the returned collection
    /// is the complete new snapshot.
    async fn generate_project(
        &self,
        requirements: &str,
        base_files: Option<FileCollection>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<FileCollection, EngineError>;

    /// Produce a sparse patch implementing a change request
    ///
    /// The patch is validated and applied by the caller; implementations
    /// should emit add/update/delete operations only for files that change.
    async fn request_patch(
        &self,
        change_request: &str,
        current_files: FileCollection,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Patch, EngineError>;
}

/// Parse a generation collaborator's JSON reply into a [`Patch`]
///
/// Helper for implementations: rejects malformed shapes at this boundary so
/// the reconciler never sees them.
///
/// # Errors
/// Returns [`EngineError::MalformedOutput`] with the parse failure message.
pub fn parse_patch_reply(json: &str) -> Result<Patch, EngineError> {
    serde_json::from_str(json).map_err(|e| EngineError::MalformedOutput(e.to_string()))
}

/// Parse a generation collaborator's JSON reply into a [`FileCollection`]
///
/// Accepts the wire shape `[{"path": ..., "content": ...}, ...]`.
///
/// # Errors
/// Returns [`EngineError::MalformedOutput`] with the parse failure message.
pub fn parse_project_reply(json: &str) -> Result<FileCollection, EngineError> {
    let records: Vec<stitch_model::FileRecord> =
        serde_json::from_str(json).map_err(|e| EngineError::MalformedOutput(e.to_string()))?;
    Ok(records.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_model::PatchOp;

    #[test]
    fn parse_patch_reply_accepts_tagged_ops() {
        let patch = parse_patch_reply(
            r#"[{"op":"update","path":"a.txt","content":"v2"},{"op":"delete","path":"b.txt"}]"#,
        )
        .unwrap();
        assert_eq!(patch.len(), 2);
        assert!(matches!(patch.ops()[1], PatchOp::Delete { .. }));
    }

    #[test]
    fn parse_patch_reply_rejects_malformed() {
        let result = parse_patch_reply(r#"[{"op":"add","path":"x"}]"#);
        assert!(matches!(result, Err(EngineError::MalformedOutput(_))));

        let result = parse_patch_reply("not json at all");
        assert!(matches!(result, Err(EngineError::MalformedOutput(_))));
    }

    #[test]
    fn parse_project_reply_builds_collection() {
        let files = parse_project_reply(
            r##"[{"path":"src/main.rs","content":"fn main() {}"},{"path":"README.md","content":"# p"}]"##,
        )
        .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files.get("src/main.rs"), Some("fn main() {}"));
    }
}
