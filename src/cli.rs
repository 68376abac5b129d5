//! Command-line interface definitions for hashguard.
//!
//! The CLI definitions are shared between the main binary and xtask (man page
//! generation).

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::digest::Algorithm;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for hashguard.
#[derive(Parser)]
#[command(
    name = "hashguard",
    version = crate::VERSION,
    about = "File integrity checker",
    long_about = "Records SHA-2 fingerprints of every file under a directory and reports \
                  what was added, modified, deleted or could not be verified since"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (default: ~/.config/hashguard/config)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Baseline manifest file (overrides storage.manifest_path)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest: Option<PathBuf>,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Record the first baseline for a directory
    Init {
        /// Directory to fingerprint
        root: PathBuf,

        /// Digest algorithm (sha256, sha384, sha512)
        #[arg(short, long)]
        algorithm: Option<Algorithm>,

        /// Overwrite an existing baseline
        #[arg(short, long)]
        force: bool,
    },

    /// Compare a directory against the baseline
    Check {
        /// Directory to verify
        root: PathBuf,

        /// Digest algorithm; must match the baseline
        #[arg(short, long)]
        algorithm: Option<Algorithm>,

        /// One line per changed path
        #[arg(short, long)]
        short: bool,

        /// Treat unreadable files as changes
        #[arg(long)]
        strict: bool,

        /// Replace the baseline with this scan afterwards
        #[arg(short, long)]
        update: bool,

        /// Do not ask before updating
        #[arg(short, long, requires = "update")]
        yes: bool,
    },

    /// Scan a directory and make the result the new baseline
    Update {
        /// Directory to fingerprint
        root: PathBuf,

        /// Digest algorithm (sha256, sha384, sha512)
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
    },

    /// List the files recorded in the baseline
    Show {
        /// Include digests, sizes and modification times
        #[arg(short, long)]
        long: bool,
    },

    /// Print digests of individual files
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Digest algorithm (sha256, sha384, sha512)
        #[arg(short, long)]
        algorithm: Option<Algorithm>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
