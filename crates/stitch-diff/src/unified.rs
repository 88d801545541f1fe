//! Unified diff summaries across whole project snapshots
//!
//! Reconstructs a proper interleaved line diff for every changed file and
//! emits a multi-file, unified-diff-like document. This is the mechanism
//! behind exportable patch files, so the output must be deterministic:
//! paths are processed in lexicographic order and repeat calls with the same
//! inputs produce byte-identical text.

use crate::lcs::{split_lines, LcsTable};
use stitch_model::FileCollection;

/// Classification of one line in a reconstructed diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    /// Present in both versions
    Same(String),
    /// Present only in the new version
    Added(String),
    /// Present only in the old version
    Removed(String),
}

/// Line counts accumulated while summarizing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DiffStats {
    /// Lines prefixed `+` across all files
    pub lines_added: usize,
    /// Lines prefixed `-` across all files
    pub lines_removed: usize,
    /// Files that produced a diff block
    pub files_changed: usize,
}

/// Full front-to-back classification of every line across two versions
///
/// Walks the LCS table backward from `(m, n)` recording every step, then
/// reverses, so insertions and deletions come out interleaved in original
/// order rather than as two blocks. Uses the same deletion-favoring
/// tie-break as line change detection.
#[must_use]
pub fn reconcile_lines(old_text: &str, new_text: &str) -> Vec<DiffLine> {
    let a = split_lines(old_text);
    let b = split_lines(new_text);
    let table = LcsTable::build(&a, &b);

    let mut entries = Vec::with_capacity(a.len().max(b.len()));
    let mut i = a.len();
    let mut j = b.len();
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            entries.push(DiffLine::Same(b[j - 1].to_string()));
            i -= 1;
            j -= 1;
        } else if i > 0 && (j == 0 || table.get(i - 1, j) >= table.get(i, j - 1)) {
            entries.push(DiffLine::Removed(a[i - 1].to_string()));
            i -= 1;
        } else {
            entries.push(DiffLine::Added(b[j - 1].to_string()));
            j -= 1;
        }
    }
    entries.reverse();
    entries
}

/// Multi-file unified diff document between two snapshots
///
/// Added files become all-`+` blocks sourced from `/dev/null`, deleted files
/// all-`-` blocks destined for `/dev/null`, unchanged files are silent, and
/// modified files get a fully interleaved reconciliation. Blank lines
/// separate per-file blocks.
#[must_use]
pub fn summarize(old_files: &FileCollection, new_files: &FileCollection) -> String {
    summarize_with_stats(old_files, new_files).0
}

/// [`summarize`] variant that also reports aggregate line counts
#[must_use]
pub fn summarize_with_stats(
    old_files: &FileCollection,
    new_files: &FileCollection,
) -> (String, DiffStats) {
    let mut out = String::new();
    let mut stats = DiffStats::default();

    for path in old_files.path_union(new_files) {
        let block = match (old_files.get(&path), new_files.get(&path)) {
            (None, Some(new_content)) => added_block(&path, new_content, &mut stats),
            (Some(old_content), None) => removed_block(&path, old_content, &mut stats),
            (Some(old_content), Some(new_content)) => {
                if old_content == new_content {
                    continue;
                }
                modified_block(&path, old_content, new_content, &mut stats)
            }
            (None, None) => unreachable!("path came from the union of both collections"),
        };

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&block);
        stats.files_changed += 1;
    }

    tracing::debug!(
        files_changed = stats.files_changed,
        lines_added = stats.lines_added,
        lines_removed = stats.lines_removed,
        "summarized snapshot diff"
    );
    (out, stats)
}

fn added_block(path: &str, content: &str, stats: &mut DiffStats) -> String {
    let mut block = format!("--- /dev/null\n+++ {path}\n");
    for line in split_lines(content) {
        block.push('+');
        block.push_str(line);
        block.push('\n');
        stats.lines_added += 1;
    }
    block
}

fn removed_block(path: &str, content: &str, stats: &mut DiffStats) -> String {
    let mut block = format!("--- {path}\n+++ /dev/null\n");
    for line in split_lines(content) {
        block.push('-');
        block.push_str(line);
        block.push('\n');
        stats.lines_removed += 1;
    }
    block
}

fn modified_block(path: &str, old_content: &str, new_content: &str, stats: &mut DiffStats) -> String {
    let mut block = format!("--- {path}\n+++ {path}\n");
    for entry in reconcile_lines(old_content, new_content) {
        match entry {
            DiffLine::Same(line) => {
                block.push_str("  ");
                block.push_str(&line);
            }
            DiffLine::Added(line) => {
                block.push('+');
                block.push_str(&line);
                stats.lines_added += 1;
            }
            DiffLine::Removed(line) => {
                block.push('-');
                block.push_str(&line);
                stats.lines_removed += 1;
            }
        }
        block.push('\n');
    }
    block
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
    fn reconcile_identical_is_all_same() {
        let lines = reconcile_lines("a\nb", "a\nb");
        assert_eq!(
            lines,
            vec![
                DiffLine::Same("a".into()),
                DiffLine::Same("b".into()),
            ]
        );
    }

    #[test]
    fn reconcile_interleaves_in_order() {
        let lines = reconcile_lines("a\nb\nc", "a\nX\nc");
        assert_eq!(
            lines,
            vec![
                DiffLine::Same("a".into()),
                DiffLine::Added("X".into()),
                DiffLine::Removed("b".into()),
                DiffLine::Same("c".into()),
            ]
        );
    }

    #[test]
    fn reconcile_pure_insertion() {
        let lines = reconcile_lines("a\nb", "a\nNEW\nb");
        assert_eq!(
            lines,
            vec![
                DiffLine::Same("a".into()),
                DiffLine::Added("NEW".into()),
                DiffLine::Same("b".into()),
            ]
        );
    }

    #[test]
    fn unchanged_files_are_silent() {
        let files = collection(&[("a.txt", "same")]);
        assert_eq!(summarize(&files, &files), "");
    }

    #[test]
    fn added_file_block() {
        let old = FileCollection::new();
        let new = collection(&[("a.txt", "one\ntwo")]);
        assert_eq!(
            summarize(&old, &new),
            "--- /dev/null\n+++ a.txt\n+one\n+two\n"
        );
    }

    #[test]
    fn deleted_file_block() {
        let old = collection(&[("a.txt", "one\ntwo")]);
        let new = FileCollection::new();
        assert_eq!(
            summarize(&old, &new),
            "--- a.txt\n+++ /dev/null\n-one\n-two\n"
        );
    }

    #[test]
    fn modified_file_block_is_interleaved() {
        let old = collection(&[("a.txt", "a\nb\nc")]);
        let new = collection(&[("a.txt", "a\nX\nc")]);
        assert_eq!(
            summarize(&old, &new),
            "--- a.txt\n+++ a.txt\n  a\n+X\n-b\n  c\n"
        );
    }

    #[test]
    fn blocks_ordered_lexicographically_and_separated() {
        let old = collection(&[("b.txt", "old")]);
        let new = collection(&[("a.txt", "new"), ("b.txt", "old\nmore")]);
        let doc = summarize(&old, &new);

        let a_pos = doc.find("+++ a.txt").unwrap();
        let b_pos = doc.find("--- b.txt").unwrap();
        assert!(a_pos < b_pos);
        assert!(doc.contains("\n\n--- b.txt"));
    }

    #[test]
    fn summarize_is_deterministic() {
        let old = collection(&[("z.txt", "1"), ("a.txt", "2"), ("m.txt", "3")]);
        let new = collection(&[("m.txt", "3!"), ("a.txt", "2"), ("z.txt", "1!")]);
        assert_eq!(summarize(&old, &new), summarize(&old, &new));
    }

    #[test]
    fn stats_count_both_sides() {
        let old = collection(&[("a.txt", "one\ntwo"), ("b.txt", "keep")]);
        let new = collection(&[("a.txt", "one\ntwo!"), ("c.txt", "fresh")]);
        let (_, stats) = summarize_with_stats(&old, &new);

        // a.txt: -two +two!; b.txt deleted: -keep; c.txt added: +fresh
        assert_eq!(stats.files_changed, 3);
        assert_eq!(stats.lines_added, 2);
        assert_eq!(stats.lines_removed, 2);
    }

    proptest::proptest! {
        #[test]
        fn reconcile_projects_back_to_inputs(
            old in "[ab\n]{0,30}",
            new in "[ab\n]{0,30}",
        ) {
            // Removing Added lines reproduces old; removing Removed lines
            // reproduces new.
            let entries = reconcile_lines(&old, &new);
            let olds: Vec<&str> = entries
                .iter()
                .filter_map(|e| match e {
                    DiffLine::Same(l) | DiffLine::Removed(l) => Some(l.as_str()),
                    DiffLine::Added(_) => None,
                })
                .collect();
            let news: Vec<&str> = entries
                .iter()
                .filter_map(|e| match e {
                    DiffLine::Same(l) | DiffLine::Added(l) => Some(l.as_str()),
                    DiffLine::Removed(_) => None,
                })
                .collect();
            proptest::prop_assert_eq!(olds.join("\n"), old);
            proptest::prop_assert_eq!(news.join("\n"), new);
        }
    }
}
