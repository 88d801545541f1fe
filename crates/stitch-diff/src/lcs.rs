//! Longest common subsequence length table
//!
//! The dynamic-programming table is the sole output of this module; callers
//! reconstruct alignments by walking it backward. O(m*n) time and space,
//! which is acceptable for source-file line counts. Callers feeding very
//! large single files should guard input sizes themselves.

/// LCS length table over two sequences A (length m) and B (length n)
///
/// `get(i, j)` is the LCS length of `A[0..i)` and `B[0..j)`, so the table
/// is (m+1) x (n+1) with a zero first row and column.
///
/// # Invariants
/// - `get(0, j) == 0` and `get(i, 0) == 0` for all i, j
/// - `get(m, n)` is the full LCS length
#[derive(Debug, Clone)]
pub struct LcsTable {
    rows: usize,
    cols: usize,
    // Row-major (m+1) x (n+1), flat to avoid per-row allocations.
    cells: Vec<usize>,
}

impl LcsTable {
    /// Build the table for sequences `a` and `b`
    ///
    /// Elements are compared by exact equality. Deterministic, no side
    /// effects.
    #[must_use]
    pub fn build<T: PartialEq>(a: &[T], b: &[T]) -> Self {
        let m = a.len();
        let n = b.len();
        let mut cells = vec![0usize; (m + 1) * (n + 1)];

        for i in 1..=m {
            for j in 1..=n {
                let value = if a[i - 1] == b[j - 1] {
                    cells[(i - 1) * (n + 1) + (j - 1)] + 1
                } else {
                    cells[(i - 1) * (n + 1) + j].max(cells[i * (n + 1) + (j - 1)])
                };
                cells[i * (n + 1) + j] = value;
            }
        }

        Self {
            rows: m + 1,
            cols: n + 1,
            cells,
        }
    }

    /// LCS length of `A[0..i)` and `B[0..j)`
    ///
    /// # Panics
    /// Panics if `i` or `j` is out of range; the table covers
    /// `0..=m` x `0..=n`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> usize {
        assert!(i < self.rows && j < self.cols, "LCS index out of range");
        self.cells[i * self.cols + j]
    }

    /// Full LCS length, `get(m, n)`
    #[inline]
    #[must_use]
    pub fn full_length(&self) -> usize {
        self.cells[self.cells.len() - 1]
    }
}

/// Split text into its line sequence
///
/// Splits on `\n` exactly, so `""` is a single empty line and a trailing
/// newline yields a trailing empty line. Line content is the comparison
/// key; no normalization is applied.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').collect()
}
