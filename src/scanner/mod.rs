//! Tree scanner: walks a directory and hashes every regular file in parallel.
//!
//! Enumeration happens on the calling thread with `walkdir`. Hashing fans out
//! over a dedicated rayon pool; workers send each result back over a channel
//! and the calling thread performs every manifest insertion, so no worker
//! touches the manifest.
//!
//! A file that cannot be read does not fail the scan. It is left out of the
//! manifest and reported as a [`ScanWarning`], which lets the diff engine tell
//! "could not read" apart from "deleted".

mod warning;

pub use warning::{ScanWarning, WarningKind};

use crate::cancel::CancellationToken;
use crate::digest::{Algorithm, Hasher};
use crate::error::{IntegrityError, Result};
use crate::manifest::{FileRecord, Manifest};
use crate::output;
use crate::utils::{relative_key, should_ignore, thread_pool};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};
use walkdir::WalkDir;

/// Predicate deciding whether an absolute path should be skipped.
pub type Exclusion = Box<dyn Fn(&Path) -> bool + Send + Sync>;

/// Callback run on the scanning thread for every file hashed.
pub type Observer = Box<dyn Fn(&FileRecord) + Send + Sync>;

/// Tunables for a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Digest algorithm for every file
    pub algorithm: Algorithm,
    /// Follow symbolic links (off by default to avoid cycles and leaving the root)
    pub follow_symlinks: bool,
    /// Worker threads; `0` means one per CPU
    pub threads: usize,
    /// Per-file read timeout
    pub read_timeout: Option<Duration>,
    /// Root-relative ignore patterns (see [`crate::utils::should_ignore`])
    pub ignore_patterns: Vec<String>,
    /// Draw a progress bar on a TTY
    pub show_progress: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            follow_symlinks: false,
            threads: 0,
            read_timeout: None,
            ignore_patterns: Vec::new(),
            show_progress: false,
        }
    }
}

/// Result of a completed scan.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Every file that was hashed successfully
    pub manifest: Manifest,
    /// Paths that could not be read or keyed, sorted by path
    pub warnings: Vec<ScanWarning>,
}

impl ScanOutcome {
    /// Whether any warning covers `path`.
    #[must_use]
    pub fn is_unverified(&self, path: &str) -> bool {
        self.warnings.iter().any(|w| w.covers(path))
    }
}

/// A regular file found during enumeration.
#[derive(Debug)]
struct Candidate {
    /// Absolute path used for reading
    absolute: PathBuf,
    /// Manifest key
    key: String,
    /// Size from directory metadata
    size: Option<u64>,
    /// Modification time from directory metadata
    modified: Option<i64>,
}

/// Enumerates and hashes all regular files under a root.
pub struct TreeScanner {
    /// Canonical root directory
    root: PathBuf,
    /// Scan tunables
    options: ScanOptions,
    /// Caller-supplied skip predicates
    exclusions: Vec<Exclusion>,
    /// Cooperative cancellation
    cancel: CancellationToken,
    /// Per-file callbacks
    observers: Vec<Observer>,
}

impl TreeScanner {
    /// Creates a scanner for `root`.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::InvalidRoot`] if `root` does not exist or is
    /// not a directory.
    pub fn new(root: impl AsRef<Path>, options: ScanOptions) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root
            .canonicalize()
            .map_err(|_| IntegrityError::InvalidRoot(root.to_path_buf()))?;
        if !canonical.is_dir() {
            return Err(IntegrityError::InvalidRoot(root.to_path_buf()));
        }

        Ok(Self {
            root: canonical,
            options,
            exclusions: Vec::new(),
            cancel: CancellationToken::new(),
            observers: Vec::new(),
        })
    }

    /// Adds a predicate; matching paths (and everything beneath matching
    /// directories) are skipped.
    #[must_use]
    pub fn with_exclusion<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.exclusions.push(Box::new(predicate));
        self
    }

    /// Skips specific files, typically the manifest and its lock file so the
    /// scanner never tracks its own output.
    #[must_use]
    pub fn with_excluded_paths<I>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let excluded: Vec<PathBuf> = paths.into_iter().map(|p| comparable_path(&p)).collect();
        if excluded.is_empty() {
            return self;
        }
        self.with_exclusion(move |path| excluded.iter().any(|e| e == path))
    }

    /// Uses `token` to cancel this scan.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Calls `observer` with each record as it joins the manifest.
    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&FileRecord) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
        self
    }

    /// Canonical root being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Options in effect.
    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Walks the tree and hashes every regular file.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::Cancelled`] if cancellation was requested at any
    ///   point; no partial manifest is returned
    /// - [`IntegrityError::Config`] if the worker pool cannot be created
    ///
    /// Per-file failures are reported in [`ScanOutcome::warnings`].
    pub fn scan(&self) -> Result<ScanOutcome> {
        let span = info_span!("scan", root = %self.root.display(), algorithm = %self.options.algorithm);
        let _guard = span.enter();
        let started = Instant::now();

        if self.cancel.is_cancelled() {
            return Err(IntegrityError::Cancelled);
        }

        let (candidates, mut warnings) = self.enumerate()?;
        debug!(files = candidates.len(), "enumeration finished");

        let pool = thread_pool::build_pool(self.options.threads)
            .map_err(|e| IntegrityError::Config(format!("failed to build worker pool: {e}")))?;
        let hasher = Hasher::new(self.options.algorithm);
        let mut builder = Manifest::builder(self.options.algorithm).root(&self.root);
        let mut progress = if self.options.show_progress {
            output::start_progress("Hashing files", candidates.len())
        } else {
            None
        };

        let (tx, rx) = mpsc::channel::<(String, Result<FileRecord>)>();

        thread::scope(|scope| -> Result<()> {
            let candidates = &candidates;
            let pool = &pool;
            let hasher = &hasher;
            scope.spawn(move || {
                pool.install(|| {
                    candidates.par_iter().for_each_with(tx, |tx, candidate| {
                        if self.cancel.is_cancelled() {
                            return;
                        }
                        let result = self.hash_candidate(hasher, candidate);
                        // Receiver only disappears if the collector bailed out
                        let _ = tx.send((candidate.key.clone(), result));
                    });
                });
            });

            for (done, (key, result)) in rx.iter().enumerate() {
                match result {
                    Ok(record) => {
                        for observer in &self.observers {
                            observer(&record);
                        }
                        builder.insert(record)?;
                    }
                    Err(IntegrityError::Cancelled) => {}
                    Err(e) => {
                        let warning = ScanWarning::from_error(key, &e);
                        debug!(path = %warning.path, kind = %warning.kind, "file skipped");
                        warnings.push(warning);
                    }
                }
                if let Some(progress) = progress.as_mut() {
                    progress.update(done + 1);
                }
            }
            Ok(())
        })?;

        if self.cancel.is_cancelled() {
            info!("scan cancelled; discarding partial results");
            return Err(IntegrityError::Cancelled);
        }

        if let Some(progress) = progress {
            progress.finish();
        }

        warnings.sort_by(|a, b| a.path.cmp(&b.path));
        let manifest = builder.build();

        info!(
            files = manifest.len(),
            warnings = warnings.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "scan complete"
        );

        Ok(ScanOutcome { manifest, warnings })
    }

    /// Lists regular files to hash, collecting traversal failures as warnings.
    fn enumerate(&self) -> Result<(Vec<Candidate>, Vec<ScanWarning>)> {
        let mut candidates = Vec::new();
        let mut warnings = Vec::new();
        let mut keys = HashSet::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.options.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_skip(e.path()));

        for entry in walker {
            if self.cancel.is_cancelled() {
                return Err(IntegrityError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let warning = self.traversal_warning(&err);
                    debug!(path = %warning.path, message = %warning.message, "traversal error");
                    warnings.push(warning);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                if entry.path_is_symlink() && !self.options.follow_symlinks {
                    debug!(path = %entry.path().display(), "not following symlink");
                }
                continue;
            }

            let key = relative_key(entry.path(), &self.root);
            if !keys.insert(key.clone()) {
                debug!(path = %entry.path().display(), key = %key, "duplicate manifest key");
                warnings.push(ScanWarning::new(
                    key,
                    WarningKind::DuplicateKey,
                    format!("{} shares its key with another file", entry.path().display()),
                ));
                continue;
            }

            let metadata = entry.metadata().ok();
            candidates.push(Candidate {
                absolute: entry.path().to_path_buf(),
                key,
                size: metadata.as_ref().map(std::fs::Metadata::len),
                modified: metadata
                    .and_then(|m| m.modified().ok())
                    .map(|t| DateTime::<Utc>::from(t).timestamp()),
            });
        }

        Ok((candidates, warnings))
    }

    /// Hashes one file into a record.
    fn hash_candidate(&self, hasher: &Hasher, candidate: &Candidate) -> Result<FileRecord> {
        let digest = hasher.digest_file_with_timeout(
            &candidate.absolute,
            self.options.read_timeout,
            &self.cancel,
        )?;
        let mut record = FileRecord::new(candidate.key.clone(), digest);
        record.size = candidate.size;
        record.modified = candidate.modified;
        Ok(record)
    }

    /// Check if a directory entry should be skipped
    fn should_skip(&self, path: &Path) -> bool {
        if self.exclusions.iter().any(|excluded| excluded(path)) {
            return true;
        }
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        should_ignore(relative, &self.options.ignore_patterns)
    }

    /// Converts a walkdir error into a warning keyed by the affected path.
    fn traversal_warning(&self, err: &walkdir::Error) -> ScanWarning {
        let key = err
            .path()
            .map(|p| relative_key(p, &self.root))
            .unwrap_or_default();
        let message = if let Some(ancestor) = err.loop_ancestor() {
            format!(
                "symlink loop back to {}",
                relative_key(ancestor, &self.root)
            )
        } else if let Some(io_err) = err.io_error() {
            io_err.to_string()
        } else {
            err.to_string()
        };
        ScanWarning::new(key, WarningKind::Traversal, message)
    }
}

/// Normalizes a path for comparison against walkdir output, which is rooted
/// at the canonical scan root.
fn comparable_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // The file may not exist yet (first save); canonicalize its parent instead
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map_or_else(|_| path.to_path_buf(), |p| p.join(name)),
        _ => path.to_path_buf(),
    }
}
