//! Change tracking for UI highlighting
//!
//! Tracks the Changed-Path Set and per-file Line-Diff Map relative to the
//! implicit baseline (the state before the most recent mutation). A model
//! patch recomputes both wholesale from the pre/post collection pair; a
//! manual edit folds into the existing state so one hand edit never erases
//! what the model touched elsewhere.

use std::collections::{BTreeMap, BTreeSet};
use stitch_diff::changed_lines;
use stitch_model::FileCollection;

/// Derived highlight state after the most recent mutation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    changed_paths: BTreeSet<String>,
    line_diffs: BTreeMap<String, BTreeSet<usize>>,
}

impl ChangeTracker {
    /// Empty tracker (no baseline yet)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute tracking state after a model patch or revert
    ///
    /// The changed set becomes exactly the paths whose content differs
    /// between `pre` and `post` or which are new in `post`; each changed
    /// path gets a fresh line diff against its pre-mutation content (empty
    /// string for newly added files).
    pub fn record_mutation(&mut self, pre: &FileCollection, post: &FileCollection) {
        self.changed_paths = pre.changed_paths(post);
        self.line_diffs = self
            .changed_paths
            .iter()
            .filter_map(|path| {
                let new_content = post.get(path)?;
                let old_content = pre.get(path).unwrap_or("");
                Some((path.clone(), changed_lines(old_content, new_content)))
            })
            .collect();
    }

    /// Record a manual single-file edit
    ///
    /// A human edit supersedes a model-attributed highlight: the edited
    /// path joins the changed set and its line-diff entry is dropped.
    /// Every other path's tracking state stays exactly as it was.
    pub fn record_manual_edit(&mut self, path: &str) {
        self.changed_paths.insert(path.to_string());
        self.line_diffs.remove(path);
    }

    /// Paths considered changed relative to the baseline
    #[must_use]
    pub fn changed_paths(&self) -> &BTreeSet<String> {
        &self.changed_paths
    }

    /// Per-file changed line numbers (1-indexed, new content)
    #[must_use]
    pub fn line_diffs(&self) -> &BTreeMap<String, BTreeSet<usize>> {
        &self.line_diffs
    }

    /// Changed line numbers for one path, if tracked
    #[must_use]
    pub fn line_diff(&self, path: &str) -> Option<&BTreeSet<usize>> {
        self.line_diffs.get(path)
    }

    /// Drop all tracking state
    pub fn clear(&mut self) {
        self.changed_paths.clear();
        self.line_diffs.clear();
    }
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

    #[test]
    fn mutation_tracks_changed_and_new_paths() {
        let pre = collection(&[("a", "1"), ("b", "2")]);
        let post = collection(&[("a", "1"), ("b", "2!"), ("c", "3")]);

        let mut tracker = ChangeTracker::new();
        tracker.record_mutation(&pre, &post);

        let expected: BTreeSet<String> = ["b".to_string(), "c".to_string()].into_iter().collect();
        assert_eq!(tracker.changed_paths(), &expected);
        assert!(tracker.line_diff("b").is_some());
        assert!(tracker.line_diff("a").is_none());
    }

    #[test]
    fn mutation_replaces_previous_state() {
        let mut tracker = ChangeTracker::new();
        tracker.record_mutation(&collection(&[]), &collection(&[("old", "x")]));
        assert!(tracker.changed_paths().contains("old"));

        let pre = collection(&[("old", "x")]);
        let post = collection(&[("old", "x"), ("fresh", "y")]);
        tracker.record_mutation(&pre, &post);

        assert!(!tracker.changed_paths().contains("old"));
        assert!(tracker.changed_paths().contains("fresh"));
    }

    #[test]
    fn line_diff_matches_content_change() {
        let pre = collection(&[("f", "line1\nline2")]);
        let post = collection(&[("f", "line1\nline2-changed\nline3")]);

        let mut tracker = ChangeTracker::new();
        tracker.record_mutation(&pre, &post);

        let expected: BTreeSet<usize> = [2, 3].into_iter().collect();
        assert_eq!(tracker.line_diff("f"), Some(&expected));
    }

    #[test]
    fn manual_edit_clears_line_diff_for_path() {
        let pre = collection(&[("f", "a")]);
        let patched = collection(&[("f", "a\nb")]);

        let mut tracker = ChangeTracker::new();
        tracker.record_mutation(&pre, &patched);
        assert!(tracker.line_diff("f").is_some());

        tracker.record_manual_edit("f");

        assert!(tracker.changed_paths().contains("f"));
        assert_eq!(tracker.line_diff("f"), None);
    }

    #[test]
    fn manual_edit_keeps_other_paths_tracking() {
        let pre = collection(&[("a", "1"), ("b", "1")]);
        let post = collection(&[("a", "1\nmodel"), ("b", "1\nmodel")]);

        let mut tracker = ChangeTracker::new();
        tracker.record_mutation(&pre, &post);
        assert!(tracker.line_diff("b").is_some());

        tracker.record_manual_edit("a");

        assert!(tracker.changed_paths().contains("a"));
        assert!(tracker.changed_paths().contains("b"));
        assert_eq!(tracker.line_diff("a"), None);
        assert!(tracker.line_diff("b").is_some());
    }

    #[test]
    fn deleted_paths_are_not_changed_paths() {
        let pre = collection(&[("gone", "x"), ("kept", "y")]);
        let post = collection(&[("kept", "y")]);

        let mut tracker = ChangeTracker::new();
        tracker.record_mutation(&pre, &post);
        assert!(tracker.changed_paths().is_empty());
    }
}
