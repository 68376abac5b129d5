//! Rendering of [`DiffResult`]s.

use super::{Verbosity, get_verbosity, warning};
use crate::diff::{ChangeKind, DiffCounts, DiffResult};
use crate::scanner::ScanWarning;
use colored::{ColoredString, Colorize};
use std::fmt::Write as _;

/// Layout of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportStyle {
    /// Grouped by category with headers.
    #[default]
    Long,
    /// One `<code> <path>` line per changed path.
    Short,
}

/// Group headers in report order.
const GROUPS: [(ChangeKind, &str); 4] = [
    (ChangeKind::Added, "New files"),
    (ChangeKind::Modified, "Modified files"),
    (ChangeKind::Removed, "Deleted files"),
    (ChangeKind::Unverified, "Could not verify"),
];

/// Renders every non-unchanged path. Empty when nothing differs.
#[must_use]
pub fn render_report(diff: &DiffResult, style: ReportStyle) -> String {
    let mut out = String::new();
    match style {
        ReportStyle::Short => {
            for (kind, path) in diff.entries() {
                let _ = writeln!(out, "{} {path}", colorize(kind, &kind.status_char().to_string()));
            }
        }
        ReportStyle::Long => {
            for (kind, header) in GROUPS {
                let paths = diff.paths(kind);
                if paths.is_empty() {
                    continue;
                }
                let _ = writeln!(out, "\n{}:", header.bold());
                for path in paths {
                    let _ = writeln!(out, "  {}: {path}", colorize(kind, kind.label()));
                }
            }
        }
    }
    out
}

/// One-line category totals, e.g. `1 added, 2 modified, 0 deleted, 7 unchanged`.
///
/// Unverified is only mentioned when non-zero.
#[must_use]
pub fn render_summary(counts: DiffCounts) -> String {
    let mut summary = format!(
        "{} added, {} modified, {} deleted",
        counts.added, counts.modified, counts.removed
    );
    if counts.unverified > 0 {
        let _ = write!(summary, ", {} unverified", counts.unverified);
    }
    let _ = write!(summary, ", {} unchanged", counts.unchanged);
    summary
}

/// Prints a report to stdout and the summary to stderr.
pub fn print_report(diff: &DiffResult, style: ReportStyle) {
    if !diff.has_changes() && !diff.has_unverified() {
        if get_verbosity() != Verbosity::Quiet {
            println!("No changes detected, {} files verified", diff.unchanged.len());
        }
        return;
    }

    print!("{}", render_report(diff, style));
    if style == ReportStyle::Long && get_verbosity() != Verbosity::Quiet {
        println!();
    }
    super::info(&render_summary(diff.counts()));
}

/// Prints scan warnings to stderr, one per line under a heading.
pub fn print_warnings(warnings: &[ScanWarning]) {
    if warnings.is_empty() {
        return;
    }
    let noun = if warnings.len() == 1 { "path" } else { "paths" };
    warning(&format!("{} {noun} could not be verified:", warnings.len()));
    for w in warnings {
        eprintln!("  {w}");
    }
}

/// Category colour.
fn colorize(kind: ChangeKind, text: &str) -> ColoredString {
    match kind {
        ChangeKind::Added => text.green(),
        ChangeKind::Modified => text.yellow(),
        ChangeKind::Removed => text.red(),
        ChangeKind::Unverified => text.magenta(),
        ChangeKind::Unchanged => text.normal(),
    }
}
