//! Command implementations.
//!
//! Each command is a thin layer over the library: it resolves settings from
//! the [`HashguardContext`], runs the scanner and diff engine, and reports
//! through [`crate::output`].

pub mod check;
pub mod hash;
pub mod init;
pub mod show;
pub mod update;

use crate::HashguardContext;
use crate::digest::Algorithm;
use crate::output::{self, Verbosity};
use crate::scanner::{ScanOutcome, TreeScanner};
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Scans `root` with the configured options, excluding hashguard's own files.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unusable root, or a
/// cancelled scan. Unreadable files become warnings in the outcome.
pub fn scan_tree(
    ctx: &HashguardContext,
    root: &Path,
    algorithm: Option<Algorithm>,
) -> Result<ScanOutcome> {
    let mut options = ctx.config.scan_options(algorithm)?;
    options.show_progress = true;

    let store = ctx.store();
    let scanner = TreeScanner::new(root, options)?
        .with_excluded_paths([
            store.path().to_path_buf(),
            store.lock_path(),
            ctx.config_path.clone(),
        ])
        .with_cancellation(ctx.cancel.clone());
    let scanner = if output::get_verbosity() == Verbosity::Verbose {
        scanner.with_observer(|record| {
            output::verbose(&format!("  {}  {}", record.digest, record.path));
        })
    } else {
        scanner
    };

    output::verbose(&format!(
        "Scanning {} ({})",
        scanner.root().display(),
        scanner.options().algorithm
    ));
    let outcome = scanner
        .scan()
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    output::print_warnings(&outcome.warnings);
    Ok(outcome)
}

/// Asks a yes/no question on stdout and reads the answer from `input`.
///
/// Anything but `y`/`yes` (case-insensitive) is a no, including end of input.
///
/// # Errors
///
/// Returns an error if stdout cannot be flushed or `input` cannot be read.
pub fn confirm<R: BufRead>(question: &str, mut input: R) -> Result<bool> {
    print!("{question} [y/N]: ");
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
