//! Manifest comparison.
//!
//! [`diff`] partitions the union of two manifests' paths into Added, Removed,
//! Modified and Unchanged. [`diff_scan`] additionally takes the scanner's
//! warnings into account: a baseline path the scan could not read lands in
//! Unverified instead of Removed.
//!
//! Both are pure functions. Work is linear in the number of distinct paths
//! (hash lookups into each manifest), followed by sorting each category so
//! reports are reproducible.

use crate::error::{IntegrityError, Result};
use crate::manifest::Manifest;
use crate::scanner::{ScanOutcome, ScanWarning, WarningKind};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Classification of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    /// Present now, absent from the baseline.
    Added,
    /// Present in both with different digests.
    Modified,
    /// In the baseline, confirmed absent now.
    Removed,
    /// In the baseline, but the current scan could not read it.
    Unverified,
    /// Present in both with equal digests.
    Unchanged,
}

impl ChangeKind {
    /// Single-character code used by `--short` output.
    #[must_use]
    pub const fn status_char(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Removed => 'D',
            Self::Unverified => '?',
            Self::Unchanged => ' ',
        }
    }

    /// Label used in long-form reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Added => "new file",
            Self::Modified => "modified",
            Self::Removed => "deleted",
            Self::Unverified => "unverified",
            Self::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffCounts {
    /// Added paths
    pub added: usize,
    /// Modified paths
    pub modified: usize,
    /// Removed paths
    pub removed: usize,
    /// Unverified paths
    pub unverified: usize,
    /// Unchanged paths
    pub unchanged: usize,
}

/// Partition of the union of two manifests' paths. Each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// Present now, absent from the baseline
    pub added: Vec<String>,
    /// Present in both with different digests
    pub modified: Vec<String>,
    /// In the baseline, confirmed absent now
    pub removed: Vec<String>,
    /// In the baseline, unreadable now
    pub unverified: Vec<String>,
    /// Present in both with equal digests
    pub unchanged: Vec<String>,
}

impl DiffResult {
    /// Whether anything was added, modified or removed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty())
    }

    /// Whether any baseline path could not be verified.
    #[must_use]
    pub fn has_unverified(&self) -> bool {
        !self.unverified.is_empty()
    }

    /// Totals per category.
    #[must_use]
    pub fn counts(&self) -> DiffCounts {
        DiffCounts {
            added: self.added.len(),
            modified: self.modified.len(),
            removed: self.removed.len(),
            unverified: self.unverified.len(),
            unchanged: self.unchanged.len(),
        }
    }

    /// Number of distinct paths across all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.added.len()
            + self.modified.len()
            + self.removed.len()
            + self.unverified.len()
            + self.unchanged.len()
    }

    /// Paths in one category.
    #[must_use]
    pub fn paths(&self, kind: ChangeKind) -> &[String] {
        match kind {
            ChangeKind::Added => &self.added,
            ChangeKind::Modified => &self.modified,
            ChangeKind::Removed => &self.removed,
            ChangeKind::Unverified => &self.unverified,
            ChangeKind::Unchanged => &self.unchanged,
        }
    }

    /// Every path that is not unchanged, grouped by category in report order
    /// (added, modified, removed, unverified), sorted within each group.
    pub fn entries(&self) -> impl Iterator<Item = (ChangeKind, &str)> {
        [
            ChangeKind::Added,
            ChangeKind::Modified,
            ChangeKind::Removed,
            ChangeKind::Unverified,
        ]
        .into_iter()
        .flat_map(move |kind| self.paths(kind).iter().map(move |p| (kind, p.as_str())))
    }

    /// Category of `path`, if it appears in either manifest.
    #[must_use]
    pub fn classify(&self, path: &str) -> Option<ChangeKind> {
        [
            ChangeKind::Added,
            ChangeKind::Modified,
            ChangeKind::Removed,
            ChangeKind::Unverified,
            ChangeKind::Unchanged,
        ]
        .into_iter()
        .find(|kind| {
            self.paths(*kind)
                .binary_search_by(|p| p.as_str().cmp(path))
                .is_ok()
        })
    }
}

/// Compares a baseline against a current manifest.
///
/// # Errors
///
/// Returns [`IntegrityError::AlgorithmMismatch`] if the manifests were hashed
/// with different algorithms; no classification is attempted.
pub fn diff(baseline: &Manifest, current: &Manifest) -> Result<DiffResult> {
    classify(baseline, current, &WarningIndex::default())
}

/// Compares a baseline against a scan, routing unreadable baseline paths to
/// [`DiffResult::unverified`].
///
/// # Errors
///
/// Same as [`diff`].
pub fn diff_scan(baseline: &Manifest, scan: &ScanOutcome) -> Result<DiffResult> {
    classify(baseline, &scan.manifest, &WarningIndex::new(&scan.warnings))
}

/// Shared implementation of [`diff`] and [`diff_scan`].
fn classify(baseline: &Manifest, current: &Manifest, warnings: &WarningIndex<'_>) -> Result<DiffResult> {
    if baseline.algorithm() != current.algorithm() {
        return Err(IntegrityError::AlgorithmMismatch {
            baseline: baseline.algorithm(),
            current: current.algorithm(),
        });
    }

    let mut result = DiffResult::default();

    for record in current.iter() {
        let bucket = match baseline.get(&record.path) {
            Some(previous) if previous.same_content(record) => &mut result.unchanged,
            Some(_) => &mut result.modified,
            None => &mut result.added,
        };
        bucket.push(record.path.clone());
    }

    for path in baseline.paths().filter(|p| !current.contains(p)) {
        if warnings.covers(path) {
            result.unverified.push(path.to_string());
        } else {
            result.removed.push(path.to_string());
        }
    }

    result.added.sort_unstable();
    result.modified.sort_unstable();
    result.removed.sort_unstable();
    result.unverified.sort_unstable();
    result.unchanged.sort_unstable();

    let counts = result.counts();
    debug!(
        added = counts.added,
        modified = counts.modified,
        removed = counts.removed,
        unverified = counts.unverified,
        unchanged = counts.unchanged,
        "diff complete"
    );

    Ok(result)
}

/// Constant-time-per-ancestor lookup of which paths scan warnings cover.
#[derive(Debug, Default)]
struct WarningIndex<'a> {
    /// Paths named directly by a warning
    exact: HashSet<&'a str>,
    /// Directories whose whole subtree is covered
    subtrees: HashSet<&'a str>,
    /// The root itself was unreadable
    covers_all: bool,
}

impl<'a> WarningIndex<'a> {
    /// Indexes `warnings`.
    fn new(warnings: &'a [ScanWarning]) -> Self {
        let mut index = Self::default();
        for warning in warnings {
            index.exact.insert(warning.path.as_str());
            if warning.kind == WarningKind::Traversal {
                if warning.path.is_empty() {
                    index.covers_all = true;
                } else {
                    index.subtrees.insert(warning.path.as_str());
                }
            }
        }
        index
    }

    /// Whether `path` or one of its ancestors has a warning.
    fn covers(&self, path: &str) -> bool {
        self.covers_all
            || self.exact.contains(path)
            || path
                .match_indices('/')
                .any(|(i, _)| self.subtrees.contains(&path[..i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{Algorithm, Hasher};
    use crate::manifest::FileRecord;

    fn manifest(algorithm: Algorithm, files: &[(&str, &str)]) -> Manifest {
        let hasher = Hasher::new(algorithm);
        Manifest::from_records(
            algorithm,
            files
                .iter()
                .map(|(path, content)| FileRecord::new(*path, hasher.digest_bytes(content.as_bytes()))),
        )
        .unwrap()
    }

    #[test]
    fn test_classifies_every_category() {
        let baseline = manifest(
            Algorithm::Sha256,
            &[("same.txt", "s"), ("edit.txt", "v1"), ("gone.txt", "g")],
        );
        let current = manifest(
            Algorithm::Sha256,
            &[("same.txt", "s"), ("edit.txt", "v2"), ("new.txt", "n")],
        );

        let result = diff(&baseline, &current).unwrap();
        assert_eq!(result.added, ["new.txt"]);
        assert_eq!(result.modified, ["edit.txt"]);
        assert_eq!(result.removed, ["gone.txt"]);
        assert_eq!(result.unchanged, ["same.txt"]);
        assert!(result.unverified.is_empty());
        assert!(result.has_changes());
        assert_eq!(result.total(), 4);
        assert_eq!(result.classify("edit.txt"), Some(ChangeKind::Modified));
        assert_eq!(result.classify("nowhere"), None);
    }

    #[test]
    fn test_self_comparison_is_clean() {
        let m = manifest(Algorithm::Sha384, &[("a", "1"), ("b/c", "2")]);
        let result = diff(&m, &m).unwrap();
        assert!(!result.has_changes());
        assert_eq!(result.unchanged, ["a", "b/c"]);
    }

    #[test]
    fn test_algorithm_mismatch_blocks_classification() {
        let baseline = manifest(Algorithm::Sha256, &[("a", "1")]);
        let current = manifest(Algorithm::Sha384, &[("a", "1")]);
        assert!(matches!(
            diff(&baseline, &current),
            Err(IntegrityError::AlgorithmMismatch {
                baseline: Algorithm::Sha256,
                current: Algorithm::Sha384
            })
        ));
    }

    #[test]
    fn test_entries_are_ordered_by_category_then_path() {
        let baseline = manifest(Algorithm::Sha256, &[("z-gone", "1"), ("m-edit", "1")]);
        let current = manifest(
            Algorithm::Sha256,
            &[("m-edit", "2"), ("b-new", "1"), ("a-new", "1")],
        );
        let result = diff(&baseline, &current).unwrap();
        let entries: Vec<_> = result.entries().collect();
        assert_eq!(
            entries,
            [
                (ChangeKind::Added, "a-new"),
                (ChangeKind::Added, "b-new"),
                (ChangeKind::Modified, "m-edit"),
                (ChangeKind::Removed, "z-gone"),
            ]
        );
    }

    #[test]
    fn test_unreadable_paths_are_unverified_not_removed() {
        let baseline = manifest(
            Algorithm::Sha256,
            &[
                ("locked.txt", "1"),
                ("private/key.pem", "2"),
                ("private/sub/cert.pem", "3"),
                ("really-gone.txt", "4"),
            ],
        );
        let scan = ScanOutcome {
            manifest: Manifest::empty(Algorithm::Sha256),
            warnings: vec![
                ScanWarning::new("locked.txt", WarningKind::PermissionDenied, "denied"),
                ScanWarning::new("private", WarningKind::Traversal, "denied"),
            ],
        };

        let result = diff_scan(&baseline, &scan).unwrap();
        assert_eq!(
            result.unverified,
            ["locked.txt", "private/key.pem", "private/sub/cert.pem"]
        );
        assert_eq!(result.removed, ["really-gone.txt"]);
        assert!(result.has_unverified());
    }

    #[test]
    fn test_unreadable_root_covers_everything() {
        let baseline = manifest(Algorithm::Sha256, &[("a", "1"), ("b/c", "2")]);
        let scan = ScanOutcome {
            manifest: Manifest::empty(Algorithm::Sha256),
            warnings: vec![ScanWarning::new("", WarningKind::Traversal, "denied")],
        };
        let result = diff_scan(&baseline, &scan).unwrap();
        assert!(result.removed.is_empty());
        assert_eq!(result.unverified.len(), 2);
        assert!(!result.has_changes());
    }
}
