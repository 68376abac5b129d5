use crate::HashguardContext;
use crate::diff;
use crate::digest::Algorithm;
use crate::output;
use anyhow::{Context, Result};
use std::path::Path;

/// Scans `root` and replaces the baseline with the result.
///
/// Creates the baseline if there is none. Changing the algorithm is allowed
/// here; the old baseline is simply discarded.
///
/// # Errors
///
/// Returns an error if:
/// - The existing baseline is corrupt
/// - The configuration is invalid or `root` is not a directory
/// - The scan is cancelled
/// - The manifest cannot be written
pub fn execute(ctx: &HashguardContext, root: &Path, algorithm: Option<Algorithm>) -> Result<()> {
    let store = ctx.store();
    let previous = store
        .load_optional()
        .context("Failed to load current baseline")?;

    let outcome = super::scan_tree(ctx, root, algorithm)?;

    match &previous {
        Some(previous) if previous.algorithm() == outcome.manifest.algorithm() => {
            let changes = diff::diff_scan(previous, &outcome)?;
            output::info(&output::render_summary(changes.counts()));
        }
        Some(previous) => output::warning(&format!(
            "Switching baseline algorithm from {} to {}",
            previous.algorithm(),
            outcome.manifest.algorithm()
        )),
        None => output::verbose("No previous baseline"),
    }

    store
        .save(&outcome.manifest)
        .context("Failed to save baseline")?;
    output::success(&format!(
        "Baseline updated ({} files, {})",
        outcome.manifest.len(),
        outcome.manifest.algorithm()
    ));
    Ok(())
}
