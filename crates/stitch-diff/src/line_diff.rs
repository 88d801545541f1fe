//! Line-level change detection for editor highlighting
//!
//! Computes which 1-indexed lines of the *new* text are additions or
//! modifications relative to the old text. The result drives UI highlighting
//! only; it is derived data and can be recomputed from the text pair at any
//! time.

use crate::lcs::{split_lines, LcsTable};
use std::collections::BTreeSet;

/// 1-indexed line numbers in `new_text` that are not part of the optimal
/// common subsequence with `old_text`
///
/// Fast path: equal inputs return the empty set without building the table.
///
/// The backward walk resolves ties by treating the step as a deletion in the
/// old text (`L[i-1][j] >= L[i][j-1]`). This is a deliberate policy, not an
/// accident: a pure deletion therefore marks nothing on the new side, and a
/// replaced line is attributed to the new line that replaced it.
#[must_use]
pub fn changed_lines(old_text: &str, new_text: &str) -> BTreeSet<usize> {
    let mut changed = BTreeSet::new();
    if old_text == new_text {
        return changed;
    }

    let a = split_lines(old_text);
    let b = split_lines(new_text);
    let table = LcsTable::build(&a, &b);

    let mut i = a.len();
    let mut j = b.len();
    // Only new-side marks matter, so the walk can stop once j reaches 0.
    while j > 0 {
        if i > 0 && a[i - 1] == b[j - 1] {
            i -= 1;
            j -= 1;
        } else if i > 0 && table.get(i - 1, j) >= table.get(i, j - 1) {
            i -= 1;
        } else {
            changed.insert(j);
            j -= 1;
        }
    }

    changed
}
