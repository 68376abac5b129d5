//! Configuration file handling.
//!
//! The configuration is a TOML file (default `~/.config/hashguard/config`):
//!
//! ```toml
//! [scan]
//! algorithm = "sha256"
//! follow_symlinks = false
//! ignore_patterns = [".git/", "*.swp"]
//! parallel_threads = 0     # 0 = one per CPU
//! read_timeout = "30s"     # optional
//!
//! [storage]
//! manifest_path = "~/.local/share/hashguard/manifest.json"
//! ```

pub mod validator;

use crate::digest::Algorithm;
use crate::error::IntegrityError;
use crate::scanner::ScanOptions;
use crate::utils::expand_tilde;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Scanner settings
    #[serde(default)]
    pub scan: ScanConfig,

    /// Where the baseline lives
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[scan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Digest algorithm name
    pub algorithm: String,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Root-relative ignore patterns
    pub ignore_patterns: Vec<String>,
    /// Hashing threads, 0 for one per CPU
    pub parallel_threads: usize,
    /// Per-file read timeout in humantime syntax (`"30s"`, `"2m"`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout: Option<String>,
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Baseline manifest location; `~/` is expanded
    pub manifest_path: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default().name().to_string(),
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
            parallel_threads: 0,
            read_timeout: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            // Create default config if it doesn't exist
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }

    /// Configured digest algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::UnsupportedAlgorithm`] for unknown names.
    pub fn algorithm(&self) -> Result<Algorithm, IntegrityError> {
        self.scan.algorithm.parse()
    }

    /// Configured per-file read timeout. An empty string or zero disables it.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::Config`] if the value is not a valid duration.
    pub fn read_timeout(&self) -> Result<Option<Duration>, IntegrityError> {
        let Some(raw) = self.scan.read_timeout.as_deref().map(str::trim) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        let timeout = humantime::parse_duration(raw).map_err(|e| {
            IntegrityError::Config(format!("scan.read_timeout '{raw}' is not a duration: {e}"))
        })?;
        Ok((!timeout.is_zero()).then_some(timeout))
    }

    /// Baseline manifest path with `~/` expanded.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        let raw = self.storage.manifest_path.to_string_lossy();
        expand_tilde(&raw).unwrap_or_else(|_| default_manifest_path())
    }

    /// Resolves scanner options, validating every value before any hashing.
    ///
    /// `algorithm` overrides the configured algorithm when given.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::UnsupportedAlgorithm`] or
    /// [`IntegrityError::Config`] for invalid settings.
    pub fn scan_options(&self, algorithm: Option<Algorithm>) -> Result<ScanOptions, IntegrityError> {
        let algorithm = match algorithm {
            Some(algorithm) => algorithm,
            None => self.algorithm()?,
        };
        Ok(ScanOptions {
            algorithm,
            follow_symlinks: self.scan.follow_symlinks,
            threads: self.scan.parallel_threads,
            read_timeout: self.read_timeout()?,
            ignore_patterns: self.scan.ignore_patterns.clone(),
            show_progress: false,
        })
    }
}

/// Default baseline location under the platform data directory.
fn default_manifest_path() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hashguard")
        .join("manifest.json")
}
