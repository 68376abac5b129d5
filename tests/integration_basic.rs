mod common;

use anyhow::Result;
use assert_cmd::Command;
use common::TestTree;
use predicates::prelude::*;

/// `hashguard` confined to the fixture's config and manifest.
fn hashguard(tree: &TestTree) -> Result<Command> {
    let mut cmd = Command::cargo_bin("hashguard")?;
    cmd.env("HOME", tree.home())
        .env("HASHGUARD_CONFIG_PATH", tree.config_path())
        .env("HASHGUARD_MANIFEST_PATH", tree.manifest_path())
        .env("NO_COLOR", "1")
        .env_remove("HASHGUARD_LOG");
    Ok(cmd)
}

#[test]
fn test_init_then_clean_check() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    tree.write("nested/b.txt", "world")?;

    hashguard(&tree)?
        .arg("init")
        .arg(tree.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("Recorded 2 files (sha256)"));
    assert!(tree.manifest_path().exists());

    hashguard(&tree)?
        .arg("check")
        .arg(tree.root())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No changes detected, 2 files verified"));
    Ok(())
}

#[test]
fn test_check_reports_changes_with_exit_code_one() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    tree.write("c.txt", "bye")?;
    hashguard(&tree)?.arg("init").arg(tree.root()).assert().success();

    tree.write("a.txt", "hello world")?;
    tree.write("b.txt", "new")?;
    tree.remove("c.txt")?;

    hashguard(&tree)?
        .args(["check", "--short"])
        .arg(tree.root())
        .assert()
        .code(1)
        .stdout("A b.txt\nM a.txt\nD c.txt\n");

    hashguard(&tree)?
        .arg("check")
        .arg(tree.root())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("new file: b.txt"))
        .stdout(predicate::str::contains("modified: a.txt"))
        .stdout(predicate::str::contains("deleted: c.txt"))
        .stderr(predicate::str::contains(
            "1 added, 1 modified, 1 deleted, 0 unchanged",
        ));
    Ok(())
}

#[test]
fn test_check_update_yes_accepts_changes() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "v1")?;
    hashguard(&tree)?.arg("init").arg(tree.root()).assert().success();

    tree.write("a.txt", "v2")?;
    hashguard(&tree)?
        .args(["check", "--update", "--yes"])
        .arg(tree.root())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Baseline updated (1 files)"));

    hashguard(&tree)?.arg("check").arg(tree.root()).assert().code(0);
    Ok(())
}

#[test]
fn test_check_update_declined_on_stdin() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "v1")?;
    hashguard(&tree)?.arg("init").arg(tree.root()).assert().success();

    tree.write("a.txt", "v2")?;
    hashguard(&tree)?
        .args(["check", "--update"])
        .arg(tree.root())
        .write_stdin("n\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[y/N]"))
        .stderr(predicate::str::contains("Baseline left unchanged"));

    hashguard(&tree)?.arg("check").arg(tree.root()).assert().code(1);
    Ok(())
}

#[test]
fn test_check_without_baseline_fails() -> Result<()> {
    let tree = TestTree::new()?;

    hashguard(&tree)?
        .arg("check")
        .arg(tree.root())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Manifest Not Found"))
        .stderr(predicate::str::contains("hashguard init"));
    Ok(())
}

#[test]
fn test_missing_root_fails() -> Result<()> {
    let tree = TestTree::new()?;

    hashguard(&tree)?
        .arg("init")
        .arg(tree.home().join("does-not-exist"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid Root"));
    assert!(!tree.manifest_path().exists());
    Ok(())
}

#[test]
fn test_algorithm_mismatch_fails() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    hashguard(&tree)?.arg("init").arg(tree.root()).assert().success();

    hashguard(&tree)?
        .args(["check", "--algorithm", "sha384"])
        .arg(tree.root())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Algorithm Mismatch"));
    Ok(())
}

#[test]
fn test_unsupported_algorithm_in_config_fails_before_scanning() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    std::fs::write(tree.config_path(), "[scan]\nalgorithm = \"md5\"\n")?;

    hashguard(&tree)?
        .arg("init")
        .arg(tree.root())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unsupported Algorithm"));
    assert!(!tree.manifest_path().exists());
    Ok(())
}

#[test]
fn test_unknown_config_keys_warn() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    std::fs::write(tree.config_path(), "[scan]\nthreads = 4\n")?;

    hashguard(&tree)?
        .arg("init")
        .arg(tree.root())
        .assert()
        .success()
        .stderr(predicate::str::contains("Unknown configuration field: scan.threads"));
    Ok(())
}

#[test]
fn test_ignore_patterns_from_config() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    tree.write("cache/blob", "noise")?;
    std::fs::write(
        tree.config_path(),
        "[scan]\nignore_patterns = [\"cache/\"]\n",
    )?;
    hashguard(&tree)?.arg("init").arg(tree.root()).assert().success();

    tree.write("cache/blob", "more noise")?;
    hashguard(&tree)?
        .arg("show")
        .assert()
        .success()
        .stdout("a.txt\n");
    hashguard(&tree)?.arg("check").arg(tree.root()).assert().code(0);
    Ok(())
}

#[test]
fn test_hash_prints_checksum_lines() -> Result<()> {
    let tree = TestTree::new()?;
    let file = tree.write("hello.txt", "hello")?;

    hashguard(&tree)?
        .arg("hash")
        .arg(&file)
        .assert()
        .success()
        .stdout(format!(
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824  {}\n",
            file.display()
        ));
    Ok(())
}

#[test]
fn test_quiet_suppresses_status_messages() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;

    hashguard(&tree)?
        .args(["--quiet", "init"])
        .arg(tree.root())
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
    Ok(())
}

#[test]
fn test_completion_generates_script() -> Result<()> {
    let tree = TestTree::new()?;

    hashguard(&tree)?
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hashguard"));
    Ok(())
}

#[test]
fn test_configured_algorithm_is_checked_against_baseline() -> Result<()> {
    let tree = TestTree::new()?;
    tree.write("a.txt", "hello")?;
    hashguard(&tree)?.arg("init").arg(tree.root()).assert().success();

    std::fs::write(tree.config_path(), "[scan]\nalgorithm = \"sha384\"\n")?;
    hashguard(&tree)?
        .arg("check")
        .arg(tree.root())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Algorithm Mismatch"));

    hashguard(&tree)?
        .args(["check", "--algorithm", "sha256"])
        .arg(tree.root())
        .assert()
        .code(0);
    Ok(())
}
