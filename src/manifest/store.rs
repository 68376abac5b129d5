//! Durable storage for the baseline manifest.
//!
//! The on-disk format is a versioned JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "algorithm": "sha256",
//!   "root": "/srv/www",
//!   "created_at": "2024-05-01T12:00:00Z",
//!   "files": {
//!     "index.html": { "digest": "9f86d0…", "algorithm": "sha256", "size": 512, "modified": 1714564800 }
//!   }
//! }
//! ```
//!
//! Unknown fields are ignored on load so newer writers stay readable. Saves
//! are atomic (temp file + rename) and serialized through an exclusive lock
//! on a sibling `.lock` file.

use super::{FileRecord, Manifest, ManifestBuilder};
use crate::digest::{Algorithm, Digest};
use crate::error::{IntegrityError, Result};
use chrono::{DateTime, Utc};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Newest format version this build reads and the one it writes.
pub const FORMAT_VERSION: u32 = 1;

/// Persisted document layout.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestDocument {
    /// Format version
    version: u32,
    /// Algorithm name, validated on load
    algorithm: String,
    /// Scan root, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,
    /// Snapshot time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    /// Records keyed by path; sorted so saved files diff cleanly
    #[serde(default)]
    files: BTreeMap<String, RecordDocument>,
}

/// Persisted form of a [`FileRecord`].
#[derive(Debug, Serialize, Deserialize)]
struct RecordDocument {
    /// Lowercase hex digest
    digest: String,
    /// Algorithm name
    algorithm: String,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    /// Unix mtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<i64>,
}

/// Loads and saves the baseline manifest at a fixed path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    /// Manifest file location
    path: PathBuf,
}

impl ManifestStore {
    /// Creates a store for the manifest at `path`. Nothing is touched on disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the manifest file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the lock file guarding saves.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Whether a manifest file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the manifest.
    ///
    /// # Errors
    ///
    /// - [`IntegrityError::ManifestNotFound`] if there is no file
    /// - [`IntegrityError::ManifestCorrupt`] if it cannot be parsed or fails
    ///   validation; a corrupt baseline is never treated as empty
    /// - [`IntegrityError::Io`] for other read failures
    pub fn load(&self) -> Result<Manifest> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IntegrityError::ManifestNotFound(self.path.clone()));
            }
            Err(e) => return Err(IntegrityError::io(&self.path, e)),
        };

        let document: ManifestDocument =
            serde_json::from_slice(&content).map_err(|e| self.corrupt(e.to_string()))?;
        let manifest = self.parse_document(document)?;

        debug!(
            path = %self.path.display(),
            records = manifest.len(),
            algorithm = %manifest.algorithm(),
            "loaded manifest"
        );
        Ok(manifest)
    }

    /// Loads the manifest, mapping a missing file to `None`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load) except for `ManifestNotFound`.
    pub fn load_optional(&self) -> Result<Option<Manifest>> {
        match self.load() {
            Ok(manifest) => Ok(Some(manifest)),
            Err(IntegrityError::ManifestNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Loads the manifest and checks it was recorded with `expected`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), plus [`IntegrityError::AlgorithmMismatch`].
    pub fn load_for(&self, expected: Algorithm) -> Result<Manifest> {
        let manifest = self.load()?;
        if manifest.algorithm() != expected {
            return Err(IntegrityError::AlgorithmMismatch {
                baseline: manifest.algorithm(),
                current: expected,
            });
        }
        Ok(manifest)
    }

    /// Atomically replaces the stored manifest with `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::Io`] if the directory cannot be created, the
    /// lock cannot be taken, or the file cannot be written. On error the
    /// previous manifest is left untouched.
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| IntegrityError::io(&parent, e))?;

        let lock_path = self.lock_path();
        let lock_file = File::create(&lock_path).map_err(|e| IntegrityError::io(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| IntegrityError::io(&lock_path, e))?;

        let result = self.write_atomically(&parent, manifest);

        // Dropping the handle releases the lock as well
        let _ = FileExt::unlock(&lock_file);

        if result.is_ok() {
            info!(
                path = %self.path.display(),
                records = manifest.len(),
                "saved manifest"
            );
        }
        result
    }

    /// Writes to a temp file in `dir`, syncs it, and renames it into place.
    fn write_atomically(&self, dir: &Path, manifest: &Manifest) -> Result<()> {
        let json = serde_json::to_vec_pretty(&Self::document_for(manifest))
            .map_err(|e| IntegrityError::io(&self.path, io::Error::other(e)))?;

        let mut temp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| IntegrityError::io(dir, e))?;
        temp.write_all(&json)
            .and_then(|()| temp.write_all(b"\n"))
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| IntegrityError::io(temp.path(), e))?;
        temp.persist(&self.path)
            .map_err(|e| IntegrityError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Converts a manifest into its persisted layout.
    fn document_for(manifest: &Manifest) -> ManifestDocument {
        let files = manifest
            .iter()
            .map(|record| {
                (
                    record.path.clone(),
                    RecordDocument {
                        digest: record.digest.to_hex(),
                        algorithm: record.digest.algorithm().name().to_string(),
                        size: record.size,
                        modified: record.modified,
                    },
                )
            })
            .collect();

        ManifestDocument {
            version: FORMAT_VERSION,
            algorithm: manifest.algorithm().name().to_string(),
            root: manifest.root().map(Path::to_path_buf),
            created_at: Some(manifest.created_at()),
            files,
        }
    }

    /// Validates a parsed document and turns it into a [`Manifest`].
    fn parse_document(&self, document: ManifestDocument) -> Result<Manifest> {
        if document.version == 0 || document.version > FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported format version {} (this build reads up to {FORMAT_VERSION})",
                document.version
            )));
        }

        let algorithm: Algorithm = document
            .algorithm
            .parse()
            .map_err(|_| self.corrupt(format!("unknown algorithm '{}'", document.algorithm)))?;

        let mut builder = ManifestBuilder::new(algorithm);
        if let Some(root) = document.root {
            builder = builder.root(root);
        }
        if let Some(created_at) = document.created_at {
            builder = builder.created_at(created_at);
        }

        for (path, entry) in document.files {
            if path.is_empty() {
                return Err(self.corrupt("record with empty path".to_string()));
            }
            let record_algorithm: Algorithm = entry.algorithm.parse().map_err(|_| {
                self.corrupt(format!(
                    "unknown algorithm '{}' for {path}",
                    entry.algorithm
                ))
            })?;
            if record_algorithm != algorithm {
                return Err(self.corrupt(format!(
                    "{path} was recorded with {record_algorithm} but the manifest declares {algorithm}"
                )));
            }
            let digest = Digest::from_hex(algorithm, &entry.digest)
                .map_err(|e| self.corrupt(format!("bad digest for {path}: {e}")))?;

            let mut record = FileRecord::new(path, digest);
            record.size = entry.size;
            record.modified = entry.modified;
            builder.insert(record)?;
        }

        Ok(builder.build())
    }

    /// Builds a `ManifestCorrupt` error for this store's path.
    fn corrupt(&self, reason: String) -> IntegrityError {
        IntegrityError::ManifestCorrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Hasher;
    use tempfile::TempDir;

    fn sample_manifest(algorithm: Algorithm) -> Manifest {
        let hasher = Hasher::new(algorithm);
        let mut builder = Manifest::builder(algorithm).root("/srv/www");
        builder
            .insert(
                FileRecord::new("index.html", hasher.digest_bytes(b"<html>"))
                    .with_metadata(6, Some(1_714_564_800)),
            )
            .unwrap();
        builder
            .insert(FileRecord::new("css/site.css", hasher.digest_bytes(b"body{}")))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_save_then_load_preserves_records() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = ManifestStore::new(dir.path().join("nested/manifest.json"));
        let manifest = sample_manifest(Algorithm::Sha384);

        store.save(&manifest)?;
        assert!(store.exists());

        let loaded = store.load()?;
        assert_eq!(loaded.algorithm(), Algorithm::Sha384);
        assert_eq!(loaded.root(), Some(Path::new("/srv/www")));
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("index.html"), manifest.get("index.html"));
        assert_eq!(loaded.get("css/site.css"), manifest.get("css/site.css"));
        assert_eq!(
            loaded.created_at().timestamp(),
            manifest.created_at().timestamp()
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path().join("absent.json"));
        assert!(matches!(
            store.load(),
            Err(IntegrityError::ManifestNotFound(_))
        ));
        assert!(store.load_optional().unwrap().is_none());
    }

    #[test]
    fn test_unknown_fields_are_ignored() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("manifest.json");
        let digest = Hasher::new(Algorithm::Sha256).digest_bytes(b"hello");
        fs::write(
            &path,
            format!(
                r#"{{
                    "version": 1,
                    "algorithm": "sha256",
                    "generator": "future-build",
                    "files": {{
                        "a.txt": {{ "digest": "{}", "algorithm": "sha256", "owner": "root" }}
                    }}
                }}"#,
                digest.to_hex()
            ),
        )?;

        let manifest = ManifestStore::new(&path).load()?;
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("a.txt").map(|r| &r.digest), Some(&digest));
        assert!(manifest.root().is_none());
        Ok(())
    }

    #[rstest::rstest]
    #[case::not_json("this is not json")]
    #[case::truncated(r#"{"version": 1, "algorithm": "sha256", "files": {"#)]
    #[case::future_version(r#"{"version": 99, "algorithm": "sha256", "files": {}}"#)]
    #[case::unknown_algorithm(r#"{"version": 1, "algorithm": "md5", "files": {}}"#)]
    #[case::bad_digest(
        r#"{"version": 1, "algorithm": "sha256", "files": {"a": {"digest": "abcd", "algorithm": "sha256"}}}"#
    )]
    #[case::mixed_algorithms(
        r#"{"version": 1, "algorithm": "sha384", "files": {"a": {"digest": "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824", "algorithm": "sha256"}}}"#
    )]
    fn test_corrupt_documents_are_rejected(#[case] content: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, content).unwrap();

        let err = ManifestStore::new(&path).load().unwrap_err();
        assert!(
            matches!(err, IntegrityError::ManifestCorrupt { .. }),
            "expected ManifestCorrupt, got {err:?}"
        );
    }

    #[test]
    fn test_non_utf8_content_is_corrupt_not_io() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();

        let err = ManifestStore::new(&path).load().unwrap_err();
        assert!(
            matches!(err, IntegrityError::ManifestCorrupt { .. }),
            "expected ManifestCorrupt, got {err:?}"
        );
    }

    #[test]
    fn test_load_for_rejects_other_algorithm() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = ManifestStore::new(dir.path().join("manifest.json"));
        store.save(&sample_manifest(Algorithm::Sha256))?;

        assert!(store.load_for(Algorithm::Sha256).is_ok());
        let err = store.load_for(Algorithm::Sha384).unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::AlgorithmMismatch {
                baseline: Algorithm::Sha256,
                current: Algorithm::Sha384
            }
        ));
        Ok(())
    }

    #[test]
    fn test_save_replaces_previous_manifest() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = ManifestStore::new(dir.path().join("manifest.json"));
        store.save(&sample_manifest(Algorithm::Sha256))?;
        store.save(&Manifest::empty(Algorithm::Sha512))?;

        let loaded = store.load()?;
        assert!(loaded.is_empty());
        assert_eq!(loaded.algorithm(), Algorithm::Sha512);

        // Only the manifest and its lock file remain; no stray temp files
        let mut names: Vec<_> = fs::read_dir(dir.path())?
            .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<_, _>>()?;
        names.sort();
        assert_eq!(names, ["manifest.json", "manifest.json.lock"]);
        Ok(())
    }
}
