//! Utility functions and helpers.
//!
//! - Path manipulation (tilde expansion, root-relative manifest keys)
//! - Ignore pattern matching
//! - File size formatting
//!
//! # Submodules
//!
//! - [`thread_pool`]: Worker pool construction for parallel hashing
//!
//! # Examples
//!
//! ```
//! use hashguard::utils::{expand_tilde, format_size};
//!
//! # fn main() -> anyhow::Result<()> {
//! // Expand tilde in paths
//! let path = expand_tilde("~/.config/hashguard/config")?;
//!
//! // Format file sizes
//! let size_str = format_size(1024 * 1024); // "1.00 MB"
//! # Ok(())
//! # }
//! ```

/// Thread pool configuration for parallel operations
pub mod thread_pool;

use anyhow::Result;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Expands a path starting with `~` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(path))
}

/// Turns `path` into a manifest key relative to `base`.
///
/// Components are joined with `/` on every platform so manifests written on
/// one OS compare cleanly on another. `path` outside `base` is keyed by its
/// full path.
///
/// On Unix a name that is not valid UTF-8 keeps every byte: invalid bytes are
/// written as `%XX` and a literal `%` in such a name as `%25`, so two distinct
/// non-UTF-8 names never share a key. Valid UTF-8 names are used as they are;
/// one that spells out an escape (`caf%E9`) can still meet a non-UTF-8 name,
/// which the scanner reports as [`crate::scanner::WarningKind::DuplicateKey`].
#[must_use]
pub fn relative_key(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(component_key(part)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn component_key(part: &OsStr) -> Cow<'_, str> {
    match part.to_str() {
        Some(name) => Cow::Borrowed(name),
        None => Cow::Owned(escape_non_utf8(part)),
    }
}

#[cfg(unix)]
fn escape_non_utf8(part: &OsStr) -> String {
    use std::fmt::Write;
    use std::os::unix::ffi::OsStrExt;

    let mut key = String::new();
    for chunk in part.as_bytes().utf8_chunks() {
        for c in chunk.valid().chars() {
            if c == '%' {
                key.push_str("%25");
            } else {
                key.push(c);
            }
        }
        for byte in chunk.invalid() {
            let _ = write!(key, "%{byte:02X}");
        }
    }
    key
}

#[cfg(not(unix))]
fn escape_non_utf8(part: &OsStr) -> String {
    part.to_string_lossy().into_owned()
}

/// Determines if a given path should be ignored based on provided patterns.
///
/// Supported pattern forms:
/// - `dir/` matches a directory component anywhere in the path
/// - `*suffix`, `prefix*`, `*contains*`
/// - anything else matches the whole path or any single component exactly
#[must_use]
pub fn should_ignore(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();

    for pattern in patterns {
        if pattern.is_empty() {
            continue;
        }
        if let Some(dir_name) = pattern.strip_suffix('/') {
            if path.components().any(|c| c.as_os_str() == dir_name) {
                return true;
            }
        } else if pattern.len() > 1 && pattern.starts_with('*') && pattern.ends_with('*') {
            let search = &pattern[1..pattern.len() - 1];
            if path_str.contains(search) {
                return true;
            }
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            if path_str.ends_with(suffix) {
                return true;
            }
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            if path_str.starts_with(prefix) {
                return true;
            }
        } else if path_str == pattern.as_str()
            || path.components().any(|c| c.as_os_str() == pattern.as_str())
        {
            return true;
        }
    }

    false
}

/// Formats a file size in bytes into a human-readable string with appropriate units.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
