//! Patch application against a file collection
//!
//! Pure, all-or-nothing reconciliation: the whole patch is validated before
//! any operation is applied, so callers never observe a self-inconsistent
//! project. The input collection is untouched; the merged result is returned
//! as a new collection.

use stitch_model::{FileCollection, Patch, PatchOp};

/// Errors produced while validating or applying a patch
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// An operation carried an empty target path
    #[error("patch operation {index} has an empty path")]
    EmptyPath {
        /// Zero-based position within the patch
        index: usize,
    },
}

/// Validate patch shape before application
///
/// The serde representation already makes missing fields unrepresentable;
/// this catches what the type system cannot, currently empty target paths
/// from programmatically built patches.
///
/// # Errors
/// Returns the first offending operation.
pub fn validate(patch: &Patch) -> Result<(), ReconcileError> {
    for (index, op) in patch.ops().iter().enumerate() {
        if op.path().is_empty() {
            return Err(ReconcileError::EmptyPath { index });
        }
    }
    Ok(())
}

/// Apply a patch to a collection, producing the merged snapshot
///
/// Operations apply in order with last-write-wins on a path. `Add` and
/// `Update` are both upserts; `Delete` of a missing path is a no-op. Fails
/// as a whole if validation fails; no partial result is ever returned.
///
/// # Errors
/// Returns [`ReconcileError`] if the patch is malformed.
pub fn apply(current: &FileCollection, patch: &Patch) -> Result<FileCollection, ReconcileError> {
    validate(patch)?;

    let mut next = current.clone();
    for op in patch.ops() {
        match op {
            PatchOp::Add { path, content } | PatchOp::Update { path, content } => {
                next.upsert(path.clone(), content.clone());
            }
            PatchOp::Delete { path } => {
                next.remove(path);
            }
        }
    }

    tracing::debug!(
        ops = patch.len(),
        files_before = current.len(),
        files_after = next.len(),
        "applied patch"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use stitch_model::FileRecord;

    fn collection(entries: &[(&str, &str)]) -> FileCollection {
        entries
            .iter()
            .map(|(p, c)| FileRecord::new(*p, *c))
            .collect()
    }

    fn patch(ops: impl IntoIterator<Item = PatchOp>) -> Patch {
        ops.into_iter().collect()
    }

    #[test]
    fn update_on_missing_path_is_upsert() {
        let current = FileCollection::new();
        let next = apply(
            &current,
            &patch([PatchOp::Update {
                path: "X".into(),
                content: "v2".into(),
            }]),
        )
        .unwrap();
        assert_eq!(next.get("X"), Some("v2"));
    }

    #[test]
    fn add_on_existing_path_is_upsert() {
        let current = collection(&[("X", "v1")]);
        let next = apply(
            &current,
            &patch([PatchOp::Add {
                path: "X".into(),
                content: "v2".into(),
            }]),
        )
        .unwrap();
        assert_eq!(next.get("X"), Some("v2"));
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn delete_missing_path_is_noop() {
        let current = collection(&[("keep", "x")]);
        let next = apply(
            &current,
            &patch([PatchOp::Delete {
                path: "missing".into(),
            }]),
        )
        .unwrap();
        assert_eq!(next, current);
    }

    #[test]
    fn later_operations_win() {
        let current = FileCollection::new();
        let next = apply(
            &current,
            &patch([
                PatchOp::Add {
                    path: "A".into(),
                    content: "1".into(),
                },
                PatchOp::Update {
                    path: "A".into(),
                    content: "2".into(),
                },
            ]),
        )
        .unwrap();
        assert_eq!(next.get("A"), Some("2"));
    }

    #[test]
    fn add_then_delete_removes() {
        let current = FileCollection::new();
        let next = apply(
            &current,
            &patch([
                PatchOp::Add {
                    path: "A".into(),
                    content: "1".into(),
                },
                PatchOp::Delete { path: "A".into() },
            ]),
        )
        .unwrap();
        assert!(!next.contains("A"));
    }

    #[test]
    fn input_collection_is_untouched() {
        let current = collection(&[("A", "original")]);
        let _ = apply(
            &current,
            &patch([PatchOp::Update {
                path: "A".into(),
                content: "changed".into(),
            }]),
        )
        .unwrap();
        assert_eq!(current.get("A"), Some("original"));
    }

    #[test]
    fn empty_path_fails_whole_apply() {
        let current = collection(&[("keep", "x")]);
        let result = apply(
            &current,
            &patch([
                PatchOp::Add {
                    path: "new".into(),
                    content: "y".into(),
                },
                PatchOp::Delete { path: String::new() },
            ]),
        );
        assert!(matches!(result, Err(ReconcileError::EmptyPath { index: 1 })));
        // nothing partially applied
        assert_eq!(current.len(), 1);
    }

    #[test]
    fn empty_patch_is_identity() {
        let current = collection(&[("a", "1"), ("b", "2")]);
        let next = apply(&current, &Patch::new()).unwrap();
        assert_eq!(next, current);
    }

    #[test]
    fn never_produces_duplicate_paths() {
        let current = collection(&[("a", "1")]);
        let next = apply(
            &current,
            &patch([
                PatchOp::Add {
                    path: "a".into(),
                    content: "2".into(),
                },
                PatchOp::Add {
                    path: "a".into(),
                    content: "3".into(),
                },
            ]),
        )
        .unwrap();
        assert_eq!(next.len(), 1);
    }

    proptest::proptest! {
        #[test]
        fn final_state_matches_last_op_per_path(
            contents in proptest::collection::vec("[a-z]{1,4}", 1..6),
        ) {
            // Repeated upserts on one path always leave the last value.
            let ops: Patch = contents
                .iter()
                .map(|c| PatchOp::Update { path: "f".into(), content: c.clone() })
                .collect();
            let next = apply(&FileCollection::new(), &ops).unwrap();
            proptest::prop_assert_eq!(next.get("f"), contents.last().map(String::as_str));
        }
    }
}
