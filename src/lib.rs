#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::arithmetic_side_effects)] // Counters and percentages cannot overflow
#![allow(clippy::float_arithmetic)] // Size formatting

//! # Hashguard - File Integrity Checker
//!
//! Hashguard records a cryptographic fingerprint of every regular file under
//! a directory and later reports which files were added, modified, removed,
//! or could not be verified since that baseline.
//!
//! ## Architecture
//!
//! - [`digest`]: streaming SHA-2 digests with cancellation and timeouts
//! - [`scanner`]: parallel directory walk producing a [`manifest::Manifest`]
//! - [`manifest`]: in-memory manifests and the on-disk [`manifest::ManifestStore`]
//! - [`diff`]: classification of a scan against a baseline
//! - [`commands`]: `init`, `check`, `update`, `show` and `hash`
//! - [`config`], [`output`], [`utils`]: configuration, reporting, helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use hashguard::digest::Algorithm;
//! use hashguard::scanner::{ScanOptions, TreeScanner};
//!
//! # fn main() -> anyhow::Result<()> {
//! let options = ScanOptions {
//!     algorithm: Algorithm::Sha384,
//!     ..ScanOptions::default()
//! };
//! let baseline = TreeScanner::new("/etc", options.clone())?.scan()?;
//! let current = TreeScanner::new("/etc", options)?.scan()?;
//!
//! let changes = hashguard::diff::diff_scan(&baseline.manifest, &current)?;
//! assert!(!changes.has_changes());
//! # Ok(())
//! # }
//! ```

/// Cooperative cancellation shared between the CLI and scans.
pub mod cancel;

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations.
pub mod commands;

/// Configuration parsing and validation.
pub mod config;

/// Manifest comparison.
pub mod diff;

/// Streaming file digests.
pub mod digest;

/// Error taxonomy for library operations.
pub mod error;

/// Manifests and their persistence.
pub mod manifest;

/// Output formatting, reports and progress display.
pub mod output;

/// Directory scanning.
pub mod scanner;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use cancel::CancellationToken;
use manifest::ManifestStore;
use std::path::PathBuf;

/// Current version of the hashguard binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to the home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/hashguard/config";

/// Environment variable overriding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "HASHGUARD_CONFIG_PATH";

/// Environment variable overriding the baseline manifest path.
pub const MANIFEST_PATH_ENV: &str = "HASHGUARD_MANIFEST_PATH";

/// Everything a command needs: resolved paths, configuration and the
/// run-wide cancellation token.
///
/// # Examples
///
/// ```no_run
/// use hashguard::HashguardContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Default locations, honouring HASHGUARD_* environment variables
/// let ctx = HashguardContext::new(None, None)?;
///
/// // Fixed locations, no prompts (for tests)
/// let ctx = HashguardContext::new_explicit(
///     "/tmp/hg/config".into(),
///     "/tmp/hg/manifest.json".into(),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HashguardContext {
    /// Path to the configuration file.
    pub config_path: PathBuf,

    /// Path to the baseline manifest.
    pub manifest_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,

    /// Whether to run in non-interactive mode (no prompts).
    pub non_interactive: bool,

    /// Triggered by Ctrl-C; scans stop at the next file boundary.
    pub cancel: CancellationToken,
}

impl HashguardContext {
    /// Resolves paths (flag, then environment, then configuration/defaults)
    /// and loads the configuration, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or if the
    /// configuration file cannot be read or created.
    pub fn new(config_override: Option<PathBuf>, manifest_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(path) => path,
            None => match std::env::var_os(CONFIG_PATH_ENV) {
                Some(path) => PathBuf::from(path),
                None => dirs::home_dir()
                    .context("Could not find home directory")?
                    .join(DEFAULT_CONFIG_PATH),
            },
        };

        let config = config::Config::load(&config_path)?;

        let validator = config::validator::ConfigValidator::new();
        match validator.validate_config_file(&config_path) {
            Ok(warnings) => warnings.iter().for_each(|w| output::warning(w)),
            Err(e) => output::warning(&format!("Configuration validation failed: {e}")),
        }

        let manifest_path = manifest_override
            .or_else(|| std::env::var_os(MANIFEST_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| config.manifest_path());

        Ok(Self {
            config_path,
            manifest_path,
            config,
            non_interactive: false,
            cancel: CancellationToken::new(),
        })
    }

    /// Creates a non-interactive context with explicit paths, ignoring the
    /// environment. A missing configuration file is created with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(config_path: PathBuf, manifest_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path)?;
        Ok(Self {
            config_path,
            manifest_path,
            config,
            non_interactive: true,
            cancel: CancellationToken::new(),
        })
    }

    /// Store for the baseline manifest.
    #[must_use]
    pub fn store(&self) -> ManifestStore {
        ManifestStore::new(&self.manifest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_context_creates_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("config");
        let manifest_path = dir.path().join("manifest.json");

        let ctx = HashguardContext::new_explicit(config_path.clone(), manifest_path.clone())?;
        assert!(config_path.exists());
        assert!(ctx.non_interactive);
        assert_eq!(ctx.store().path(), manifest_path);
        assert!(!ctx.cancel.is_cancelled());
        Ok(())
    }

    #[test]
    fn test_overrides_take_precedence() -> Result<()> {
        let dir = TempDir::new()?;
        let manifest_path = dir.path().join("elsewhere.json");

        let ctx = HashguardContext::new(
            Some(dir.path().join("config")),
            Some(manifest_path.clone()),
        )?;
        assert_eq!(ctx.manifest_path, manifest_path);
        Ok(())
    }
}
