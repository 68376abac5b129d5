use crate::HashguardContext;
use crate::digest::Algorithm;
use crate::output;
use anyhow::{Context, Result};
use std::path::Path;

/// Records the first baseline for `root`.
///
/// # Errors
///
/// Returns an error if:
/// - A baseline already exists and `force` is not set
/// - The configuration is invalid or `root` is not a directory
/// - The scan is cancelled
/// - The manifest cannot be written
pub fn execute(
    ctx: &HashguardContext,
    root: &Path,
    algorithm: Option<Algorithm>,
    force: bool,
) -> Result<()> {
    let store = ctx.store();
    if store.exists() && !force {
        anyhow::bail!(
            "Baseline already exists at {}. Use 'hashguard update' or --force to replace it",
            store.path().display()
        );
    }

    let outcome = super::scan_tree(ctx, root, algorithm)?;
    store
        .save(&outcome.manifest)
        .context("Failed to save baseline")?;

    output::success(&format!(
        "Recorded {} files ({}) in {}",
        outcome.manifest.len(),
        outcome.manifest.algorithm(),
        store.path().display()
    ));
    if !outcome.warnings.is_empty() {
        output::warning(&format!(
            "{} unreadable paths are not part of the baseline",
            outcome.warnings.len()
        ));
    }
    Ok(())
}
