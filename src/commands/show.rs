use crate::HashguardContext;
use crate::manifest::{FileRecord, Manifest};
use crate::output;
use crate::utils::format_size;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::Colorize;

/// Lists the baseline's files, sorted by path.
///
/// # Errors
///
/// Returns an error if there is no baseline or it is corrupt.
pub fn execute(ctx: &HashguardContext, long: bool) -> Result<()> {
    let manifest = ctx.store().load().context("Failed to load baseline")?;

    output::info(&header(&manifest));
    for record in manifest.sorted_records() {
        if long {
            println!("{}", long_line(record));
        } else {
            println!("{}", record.path);
        }
    }
    Ok(())
}

/// Summary line describing the baseline.
fn header(manifest: &Manifest) -> String {
    let root = manifest
        .root()
        .map_or_else(|| "unknown root".to_string(), |r| r.display().to_string());
    format!(
        "{} files under {}, {} baseline from {}",
        manifest.len(),
        root,
        manifest.algorithm(),
        manifest
            .created_at()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    )
}

/// `<hex>  <size>  <mtime>  <path>`
fn long_line(record: &FileRecord) -> String {
    let size = record.size.map_or_else(|| "-".to_string(), format_size);
    let modified = record
        .modified
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map_or_else(
            || "-".to_string(),
            |t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        );
    format!(
        "{}  {:>10}  {}  {}",
        record.digest.to_hex().dimmed(),
        size,
        modified,
        record.path
    )
}
