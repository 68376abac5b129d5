//! Manifest data model: an immutable snapshot of file digests.
//!
//! A [`Manifest`] is produced either by the scanner (the current state of a
//! tree) or by [`store::ManifestStore::load`] (the baseline). It has no
//! mutating API. Updating the baseline means saving a different manifest.

pub mod store;

use crate::digest::{Algorithm, Digest};
use crate::error::{IntegrityError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub use store::ManifestStore;

/// One tracked file at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Root-relative path using `/` separators.
    pub path: String,
    /// Content digest; carries its algorithm.
    pub digest: Digest,
    /// File size in bytes, for diagnostics only.
    pub size: Option<u64>,
    /// Unix timestamp of last modification, for diagnostics only.
    pub modified: Option<i64>,
}

impl FileRecord {
    /// Creates a record without diagnostic metadata.
    pub fn new(path: impl Into<String>, digest: Digest) -> Self {
        Self {
            path: path.into(),
            digest,
            size: None,
            modified: None,
        }
    }

    /// Attaches size and modification time.
    #[must_use]
    pub const fn with_metadata(mut self, size: u64, modified: Option<i64>) -> Self {
        self.size = Some(size);
        self.modified = modified;
        self
    }

    /// Content equality. Metadata is deliberately ignored.
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

/// Immutable mapping from path to [`FileRecord`], all hashed with one algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Algorithm every record was hashed with
    algorithm: Algorithm,
    /// Absolute root the paths are relative to, if known
    root: Option<PathBuf>,
    /// When the snapshot was taken
    created_at: DateTime<Utc>,
    /// Records keyed by path
    records: HashMap<String, FileRecord>,
}

impl Manifest {
    /// Starts building a manifest for `algorithm`.
    #[must_use]
    pub fn builder(algorithm: Algorithm) -> ManifestBuilder {
        ManifestBuilder::new(algorithm)
    }

    /// An empty manifest.
    #[must_use]
    pub fn empty(algorithm: Algorithm) -> Self {
        ManifestBuilder::new(algorithm).build()
    }

    /// Builds a manifest from records in one go.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::AlgorithmMismatch`] if any record was hashed
    /// with a different algorithm.
    pub fn from_records<I>(algorithm: Algorithm, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let mut builder = ManifestBuilder::new(algorithm);
        for record in records {
            builder.insert(record)?;
        }
        Ok(builder.build())
    }

    /// Algorithm every record in this manifest was hashed with.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Absolute root the paths are relative to, if recorded.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// When the snapshot was taken.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Looks up a record by path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.get(path)
    }

    /// Whether `path` is tracked.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.records.contains_key(path)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the manifest has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.values()
    }

    /// Iterates paths in no particular order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Records sorted by path, for display.
    #[must_use]
    pub fn sorted_records(&self) -> Vec<&FileRecord> {
        let mut records: Vec<_> = self.records.values().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }
}

/// Accumulates records for a new [`Manifest`].
#[derive(Debug)]
pub struct ManifestBuilder {
    /// Algorithm records must match
    algorithm: Algorithm,
    /// Root recorded on the manifest
    root: Option<PathBuf>,
    /// Timestamp override (defaults to build time)
    created_at: Option<DateTime<Utc>>,
    /// Records collected so far
    records: HashMap<String, FileRecord>,
}

impl ManifestBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            root: None,
            created_at: None,
            records: HashMap::new(),
        }
    }

    /// Records the absolute scan root.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Overrides the creation timestamp.
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Adds a record, replacing any earlier record with the same path.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::AlgorithmMismatch`] if the record's digest
    /// was produced by a different algorithm.
    pub fn insert(&mut self, record: FileRecord) -> Result<()> {
        let record_algorithm = record.digest.algorithm();
        if record_algorithm != self.algorithm {
            return Err(IntegrityError::AlgorithmMismatch {
                baseline: self.algorithm,
                current: record_algorithm,
            });
        }
        self.records.insert(record.path.clone(), record);
        Ok(())
    }

    /// Number of records inserted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been inserted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Freezes the builder into a [`Manifest`].
    #[must_use]
    pub fn build(self) -> Manifest {
        Manifest {
            algorithm: self.algorithm,
            root: self.root,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            records: self.records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Hasher;

    fn record(path: &str, content: &str) -> FileRecord {
        FileRecord::new(path, Hasher::new(Algorithm::Sha256).digest_bytes(content.as_bytes()))
    }

    #[test]
    fn test_builder_keys_by_path() -> anyhow::Result<()> {
        let mut builder = Manifest::builder(Algorithm::Sha256).root("/srv/data");
        builder.insert(record("a.txt", "one"))?;
        builder.insert(record("b/c.txt", "two"))?;
        builder.insert(record("a.txt", "three"))?;
        assert_eq!(builder.len(), 2);

        let manifest = builder.build();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.root(), Some(Path::new("/srv/data")));
        assert!(manifest.contains("b/c.txt"));
        assert_eq!(manifest.get("a.txt"), Some(&record("a.txt", "three")));
        Ok(())
    }

    #[test]
    fn test_builder_rejects_foreign_algorithm() {
        let mut builder = Manifest::builder(Algorithm::Sha384);
        let err = builder.insert(record("a.txt", "x")).unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::AlgorithmMismatch {
                baseline: Algorithm::Sha384,
                current: Algorithm::Sha256
            }
        ));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_metadata_does_not_affect_content_equality() {
        let plain = record("a.txt", "same");
        let annotated = record("a.txt", "same").with_metadata(4, Some(1_700_000_000));
        assert!(plain.same_content(&annotated));
        assert!(!plain.same_content(&record("a.txt", "other")));
    }

    #[test]
    fn test_sorted_records() -> anyhow::Result<()> {
        let manifest = Manifest::from_records(
            Algorithm::Sha256,
            [record("z", "1"), record("a", "2"), record("m/n", "3")],
        )?;
        let paths: Vec<_> = manifest
            .sorted_records()
            .into_iter()
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(paths, ["a", "m/n", "z"]);
        Ok(())
    }
}
