//! File records and project file collections
//!
//! A [`FileCollection`] is one complete project snapshot: a set of
//! path-unique [`FileRecord`]s. Paths are the only addressable identity;
//! two records describe "the same file" iff their paths are equal, and the
//! file is "unchanged" iff the content is also byte-equal (no normalization).

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// A single project file: path plus full text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the project root, unique within a collection
    pub path: String,
    /// Full text content
    pub content: String,
}

impl FileRecord {
    /// Create a new file record
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Content hash of this record's text
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::compute(self.content.as_bytes())
    }
}

/// One complete project snapshot: path-unique file records
///
/// Backed by a `BTreeMap` so iteration is always lexicographic by path,
/// which keeps downstream diff output deterministic regardless of the
/// order files were inserted.
///
/// # Invariants
/// - Paths are unique (enforced by the map keying)
/// - `clone()` produces a deep, independent copy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileCollection {
    files: BTreeMap<String, String>,
}

impl FileCollection {
    /// Create an empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file, returning the previous content if any
    pub fn upsert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<String> {
        self.files.insert(path.into(), content.into())
    }

    /// Remove a file, returning its content if it was present
    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }

    /// Content at a path
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Whether a path is present
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Number of files
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the collection is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All paths, lexicographic order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// (path, content) pairs, lexicographic by path
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Materialize as owned records, lexicographic by path
    #[must_use]
    pub fn records(&self) -> Vec<FileRecord> {
        self.files
            .iter()
            .map(|(p, c)| FileRecord::new(p.clone(), c.clone()))
            .collect()
    }

    /// Union of paths present in either collection, lexicographic order
    #[must_use]
    pub fn path_union(&self, other: &Self) -> BTreeSet<String> {
        self.files
            .keys()
            .chain(other.files.keys())
            .cloned()
            .collect()
    }

    /// Digest over the whole collection
    ///
    /// Hashes every (path, content) pair with length framing, in the map's
    /// lexicographic order, so equal collections always digest equally and
    /// the result is insensitive to insertion order. Derived data: used for
    /// unchanged-detection and storage integrity checks, never identity.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        for (path, content) in &self.files {
            hasher.update(u64::try_from(path.len()).unwrap_or(u64::MAX).to_be_bytes());
            hasher.update(path.as_bytes());
            hasher.update(u64::try_from(content.len()).unwrap_or(u64::MAX).to_be_bytes());
            hasher.update(content.as_bytes());
        }
        ContentHash::new(hasher.finalize().into())
    }

    /// Paths whose content differs between `self` (old) and `other` (new),
    /// or which exist only in `other`
    ///
    /// This is the Changed-Path Set relative to `self` as baseline. Paths
    /// deleted in `other` are not included; deletions have no line in the
    /// new snapshot to highlight.
    #[must_use]
    pub fn changed_paths(&self, other: &Self) -> BTreeSet<String> {
        other
            .files
            .iter()
            .filter(|(path, content)| self.files.get(*path) != Some(content))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl FromIterator<FileRecord> for FileCollection {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|record| (record.path, record.content))
                .collect(),
        }
    }
}

impl FromIterator<(String, String)> for FileCollection {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
