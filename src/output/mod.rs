//! Terminal output for hashguard commands.
//!
//! Change reports and `hash` lines are written to stdout, where scripts read
//! them. Status lines, scan warnings and the progress line are written to
//! stderr, so `hashguard check > report.txt` captures the report alone.
//!
//! `--quiet` leaves only warnings, errors and the report. `--verbose` adds the
//! scan root and one line per hashed file.

mod progress;
mod report;

use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

pub use progress::Progress;
pub use report::{ReportStyle, print_report, print_warnings, render_report, render_summary};

/// How much status output a command writes to stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// `--quiet`: warnings and errors only.
    Quiet = 0,
    /// Status lines and the progress line.
    Normal = 1,
    /// `--verbose`: also each hashed file.
    Verbose = 2,
}

impl Verbosity {
    const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Quiet,
            2 => Self::Verbose,
            _ => Self::Normal,
        }
    }
}

/// Process-wide level, set once by `main` from the CLI flags.
static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Changes the level used by every function in this module.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Level currently in effect.
pub fn get_verbosity() -> Verbosity {
    Verbosity::from_level(VERBOSITY.load(Ordering::Relaxed))
}

/// `✓` line in green, e.g. "Baseline updated". Hidden by `--quiet`.
pub fn success(message: &str) {
    if get_verbosity() > Verbosity::Quiet {
        eprintln!("{} {}", "✓".green(), message.green());
    }
}

/// `✗` line in bold red.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red().bold());
}

/// `⚠` line in bold yellow. Shown even with `--quiet`.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow().bold());
}

/// Dimmed status line. Hidden by `--quiet`.
pub fn info(message: &str) {
    if get_verbosity() > Verbosity::Quiet {
        eprintln!("{}", message.dimmed());
    }
}

/// Dimmed detail line, only with `--verbose`.
pub fn verbose(message: &str) {
    if get_verbosity() == Verbosity::Verbose {
        eprintln!("{}", message.dimmed());
    }
}

/// Progress line for a scan of `total` files; `None` with `--quiet`.
#[must_use]
pub fn start_progress(title: &str, total: usize) -> Option<Progress> {
    (get_verbosity() > Verbosity::Quiet).then(|| Progress::new(title, total))
}
