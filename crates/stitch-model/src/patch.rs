//! Patch operations
//!
//! A [`Patch`] is an ordered sequence of file-level operations emitted by the
//! generation collaborator. Operations are applied in order; later operations
//! on the same path win. The tagged serde representation rejects malformed
//! shapes (missing `path`, add/update missing `content`) at the
//! deserialization boundary instead of deep inside the reconciler.

use serde::{Deserialize, Serialize};

/// A single file-level operation
///
/// `Add` and `Update` are deliberately both upserts: a model may emit `add`
/// for a pre-existing path (or `update` for a new one) without causing an
/// error. `Delete` of a missing path is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Create a file (upsert if the path already exists)
    Add { path: String, content: String },
    /// Replace a file's content (upsert if the path does not exist)
    Update { path: String, content: String },
    /// Remove a file (no-op if the path does not exist)
    Delete { path: String },
}

impl PatchOp {
    /// The path this operation targets
    #[inline]
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Update { path, .. } | Self::Delete { path } => path,
        }
    }

    /// New content carried by this operation, if any
    #[inline]
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Add { content, .. } | Self::Update { content, .. } => Some(content),
            Self::Delete { .. } => None,
        }
    }
}

/// Ordered sequence of patch operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    /// Create an empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation
    pub fn push(&mut self, op: PatchOp) {
        self.ops.push(op);
    }

    /// Operations in application order
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Number of operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether the patch has no operations
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl FromIterator<PatchOp> for Patch {
    fn from_iter<I: IntoIterator<Item = PatchOp>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Patch {
    type Item = PatchOp;
    type IntoIter = std::vec::IntoIter<PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}
