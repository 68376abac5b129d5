use crate::HashguardContext;
use crate::diff::{self, DiffResult};
use crate::digest::Algorithm;
use crate::error::IntegrityError;
use crate::output::{self, ReportStyle};
use anyhow::{Context, Result};
use std::io;
use std::path::Path;

/// Flags of `hashguard check`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Expected algorithm; defaults to the configured one
    pub algorithm: Option<Algorithm>,
    /// One line per path instead of grouped output
    pub short: bool,
    /// Count unverified paths as changes
    pub strict: bool,
    /// Promote the scan to baseline afterwards
    pub update: bool,
    /// Skip the confirmation prompt
    pub yes: bool,
}

/// Verdict of a check, mapped to the process exit status by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The tree matches the baseline.
    Clean,
    /// Files were added, modified or removed (or, in strict mode, could not
    /// be verified).
    Changed,
}

impl CheckOutcome {
    /// Verdict for `diff` under the given strictness.
    #[must_use]
    pub fn from_diff(diff: &DiffResult, strict: bool) -> Self {
        if diff.has_changes() || (strict && diff.has_unverified()) {
            Self::Changed
        } else {
            Self::Clean
        }
    }
}

/// Scans `root` and reports differences against the stored baseline.
///
/// # Errors
///
/// Returns an error if:
/// - There is no baseline, or it is corrupt
/// - The scan algorithm (flag, else configuration) differs from the
///   baseline's algorithm
/// - The configuration is invalid or `root` is not a directory
/// - The scan is cancelled
/// - Promoting the scan fails
pub fn execute(ctx: &HashguardContext, root: &Path, options: CheckOptions) -> Result<CheckOutcome> {
    let store = ctx.store();

    // Algorithm is verified against the baseline before any file is read
    let algorithm = match options.algorithm {
        Some(algorithm) => algorithm,
        None => ctx.config.algorithm()?,
    };
    let baseline = match store.load_for(algorithm) {
        Ok(baseline) => baseline,
        Err(e @ IntegrityError::ManifestNotFound(_)) => {
            return Err(anyhow::Error::new(e)
                .context("No baseline recorded yet. Run 'hashguard init <root>' first"));
        }
        Err(e) => return Err(e).context("Failed to load baseline"),
    };

    let outcome = super::scan_tree(ctx, root, Some(baseline.algorithm()))?;
    if let (Some(recorded), Some(scanned)) = (baseline.root(), outcome.manifest.root())
        && recorded != scanned
    {
        output::warning(&format!(
            "Baseline was recorded for {}, checking {}",
            recorded.display(),
            scanned.display()
        ));
    }

    let changes = diff::diff_scan(&baseline, &outcome)?;
    let style = if options.short {
        ReportStyle::Short
    } else {
        ReportStyle::Long
    };
    output::print_report(&changes, style);

    let verdict = CheckOutcome::from_diff(&changes, options.strict);

    if options.update {
        if !changes.has_changes() && !changes.has_unverified() {
            output::info("Baseline already up to date");
        } else if confirm_update(ctx, options.yes)? {
            if changes.has_unverified() {
                output::warning("Unverified paths will be dropped from the new baseline");
            }
            store
                .save(&outcome.manifest)
                .context("Failed to update baseline")?;
            output::success(&format!(
                "Baseline updated ({} files)",
                outcome.manifest.len()
            ));
        } else {
            output::info("Baseline left unchanged");
        }
    }

    Ok(verdict)
}

/// Asks before promoting, unless `yes` was given. Never prompts in
/// non-interactive contexts.
fn confirm_update(ctx: &HashguardContext, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if ctx.non_interactive {
        output::info("Not prompting in non-interactive mode; pass --yes to update");
        return Ok(false);
    }
    super::confirm("Update the baseline with these changes?", io::stdin().lock())
}
