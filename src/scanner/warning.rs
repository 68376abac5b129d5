//! Non-fatal, per-path scan failures.

use crate::error::IntegrityError;
use std::fmt;
use std::io;

/// Why a path could not be hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// The file exists but could not be opened or read due to permissions.
    PermissionDenied,
    /// The file disappeared between enumeration and hashing.
    Vanished,
    /// Reading exceeded the configured per-file timeout.
    TimedOut,
    /// Any other read failure (device error, truncated stream, ...).
    Io,
    /// A directory could not be listed or a symlink loop was found; covers
    /// everything beneath the path.
    Traversal,
    /// Another file in the tree maps to the same manifest key.
    DuplicateKey,
}

impl WarningKind {
    /// Short label for reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::Vanished => "vanished",
            Self::TimedOut => "timed out",
            Self::Io => "read error",
            Self::Traversal => "unreadable directory",
            Self::DuplicateKey => "ambiguous name",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A path the scanner could not hash. The path is absent from the resulting
/// manifest, but must not be read as a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// Root-relative path (empty for the root itself)
    pub path: String,
    /// Failure category
    pub kind: WarningKind,
    /// Underlying error text
    pub message: String,
}

impl ScanWarning {
    /// Creates a warning.
    pub fn new(path: impl Into<String>, kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    /// Classifies a per-file hashing error.
    #[must_use]
    pub fn from_error(path: String, err: &IntegrityError) -> Self {
        match err {
            IntegrityError::Io { source, .. } => {
                let kind = match source.kind() {
                    io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
                    io::ErrorKind::NotFound => WarningKind::Vanished,
                    _ => WarningKind::Io,
                };
                Self::new(path, kind, source.to_string())
            }
            IntegrityError::TimedOut { after, .. } => Self::new(
                path,
                WarningKind::TimedOut,
                format!("no data within {}", humantime::format_duration(*after)),
            ),
            other => Self::new(path, WarningKind::Io, other.to_string()),
        }
    }

    /// Whether this warning accounts for `path` being missing from a scan.
    ///
    /// File-level warnings cover their own path. Traversal warnings also cover
    /// every path beneath the directory.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        if self.path == path {
            return true;
        }
        if self.kind != WarningKind::Traversal {
            return false;
        }
        self.path.is_empty()
            || path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "." } else { &self.path };
        write!(f, "{path}: {} ({})", self.kind, self.message)
    }
}
