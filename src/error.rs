//! Error taxonomy for hashguard.
//!
//! Fatal errors abort a run. Per-file read failures during a scan are not
//! represented here as failures of the scan itself; the scanner converts them
//! into [`crate::scanner::ScanWarning`]s instead.

use crate::digest::Algorithm;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T, E = IntegrityError> = std::result::Result<T, E>;

/// Categorized errors produced by the digest engine, scanner, diff engine and
/// manifest store.
#[derive(Debug, Error)]
pub enum IntegrityError {
    /// The requested digest algorithm is not in the supported set.
    #[error("unsupported digest algorithm '{0}' (supported: sha256, sha384, sha512)")]
    UnsupportedAlgorithm(String),

    /// Two manifests (or a manifest and the configured scan) use different
    /// digest algorithms, so their digests cannot be compared.
    #[error(
        "algorithm mismatch: baseline was recorded with {baseline}, current scan uses {current}"
    )]
    AlgorithmMismatch {
        /// Algorithm of the baseline manifest.
        baseline: Algorithm,
        /// Algorithm of the current scan.
        current: Algorithm,
    },

    /// The persisted manifest could not be parsed or failed validation.
    #[error("manifest {} is corrupt: {reason}", .path.display())]
    ManifestCorrupt {
        /// Location of the manifest file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// No manifest exists at the configured location.
    #[error("no baseline manifest found at {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// The scan root is missing or not a directory.
    #[error("scan root {} does not exist or is not a directory", .0.display())]
    InvalidRoot(PathBuf),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Reading a file did not finish within the configured timeout.
    #[error("timed out after {after:?} reading {}", .path.display())]
    TimedOut {
        /// File being read.
        path: PathBuf,
        /// Configured timeout.
        after: Duration,
    },

    /// An I/O operation on a specific path failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// Path the operation was acting on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IntegrityError {
    /// Wraps an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short category name used in user-facing error output.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedAlgorithm(_) => "Unsupported Algorithm",
            Self::AlgorithmMismatch { .. } => "Algorithm Mismatch",
            Self::ManifestCorrupt { .. } => "Corrupt Manifest",
            Self::ManifestNotFound(_) => "Manifest Not Found",
            Self::InvalidRoot(_) => "Invalid Root",
            Self::Cancelled => "Cancelled",
            Self::TimedOut { .. } => "Timeout",
            Self::Io { .. } => "I/O Error",
            Self::Config(_) => "Configuration Error",
        }
    }
}
