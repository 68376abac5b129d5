use crate::HashguardContext;
use crate::digest::{Algorithm, Hasher};
use crate::error::IntegrityError;
use crate::output;
use anyhow::Result;
use std::path::PathBuf;

/// Prints `<hex>  <path>` for each file, in the format of `sha256sum`.
///
/// Unreadable files are reported and skipped; the command fails at the end if
/// any file could not be hashed.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the run is cancelled,
/// or at least one file could not be read.
pub fn execute(ctx: &HashguardContext, files: &[PathBuf], algorithm: Option<Algorithm>) -> Result<()> {
    let algorithm = match algorithm {
        Some(algorithm) => algorithm,
        None => ctx.config.algorithm()?,
    };
    let timeout = ctx.config.read_timeout()?;
    let hasher = Hasher::new(algorithm);

    let mut failed = 0usize;
    for file in files {
        match hasher.digest_file_with_timeout(file, timeout, &ctx.cancel) {
            Ok(digest) => println!("{digest}  {}", file.display()),
            Err(IntegrityError::Cancelled) => return Err(IntegrityError::Cancelled.into()),
            Err(e) => {
                output::error(&e.to_string());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} files could not be hashed", files.len());
    }
    Ok(())
}
