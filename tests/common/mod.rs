#![allow(dead_code)]

use anyhow::Result;
use hashguard::HashguardContext;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A directory tree to fingerprint, with its own config and manifest
/// locations next to it.
pub struct TestTree {
    pub temp_dir: TempDir,
    pub ctx: HashguardContext,
}

impl TestTree {
    /// Creates an empty tree under `<tmp>/tree`, config at
    /// `<tmp>/.config/hashguard/config` and manifest at `<tmp>/state/manifest.json`.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("tree"))?;
        let ctx = HashguardContext::new_explicit(
            temp_dir.path().join(".config/hashguard/config"),
            temp_dir.path().join("state/manifest.json"),
        )?;
        Ok(Self { temp_dir, ctx })
    }

    /// Root of the tree being fingerprinted.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("tree")
    }

    /// Temporary directory holding everything.
    pub fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> &Path {
        &self.ctx.config_path
    }

    pub fn manifest_path(&self) -> &Path {
        &self.ctx.manifest_path
    }

    /// Writes `content` to a root-relative path, creating parent directories.
    pub fn write(&self, relative: &str, content: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Deletes a root-relative file.
    pub fn remove(&self, relative: &str) -> Result<()> {
        fs::remove_file(self.root().join(relative))?;
        Ok(())
    }
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new().expect("Failed to create test tree")
    }
}

/// Whether the current process can read files regardless of permissions
/// (root in a container). Permission tests are skipped then.
#[cfg(unix)]
pub fn permissions_are_enforced(dir: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    let probe = dir.join(".permission-probe");
    if fs::write(&probe, "x").is_err() {
        return false;
    }
    let _ = fs::set_permissions(&probe, fs::Permissions::from_mode(0o000));
    let enforced = fs::read(&probe).is_err();
    let _ = fs::set_permissions(&probe, fs::Permissions::from_mode(0o644));
    let _ = fs::remove_file(&probe);
    enforced
}
