//! Tests for the castfix binary.
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const SOURCE: &str = "char *mutate(const char *cp) { return (char*)cp; }\n\
int to_int(double d) { return (int)d; }\n";

const REWRITTEN: &str = "char *mutate(const char *cp) { return const_cast<char*>(cp); }\n\
int to_int(double d) { return static_cast<int>(d); }\n";

#[test]
fn test_help_mentions_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(".castfix.toml"));
    Ok(())
}

#[test]
fn test_preview_does_not_modify_files() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .arg("cast.cpp")
        .assert()
        .success()
        .stdout(predicate::str::contains("const_cast<char*>("))
        .stdout(predicate::str::contains("static_cast<int>("))
        .stdout(predicate::str::contains("--apply"));

    assert_eq!(fs::read_to_string(dir.path().join("cast.cpp"))?, SOURCE);
    Ok(())
}

#[test]
fn test_apply_rewrites_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir_all(dir.path().join("src"))?;
    fs::write(dir.path().join("src/cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path()).args(["--apply", "src"]).assert().success();

    assert_eq!(fs::read_to_string(dir.path().join("src/cast.cpp"))?, REWRITTEN);
    Ok(())
}

#[test]
fn test_apply_refuses_files_outside_root() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let project = dir.path().join("project");
    let outside = dir.path().join("outside");
    fs::create_dir_all(&project)?;
    fs::create_dir_all(&outside)?;
    fs::write(outside.join("cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(&project)
        .args(["--apply", "../outside/cast.cpp"])
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(outside.join("cast.cpp"))?, SOURCE);
    Ok(())
}

#[test]
fn test_stdout_prints_rewritten_unit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .args(["--stdout", "cast.cpp"])
        .assert()
        .success()
        .stdout(REWRITTEN);
    Ok(())
}

#[test]
fn test_stdout_prints_unchanged_unit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("clean.cpp"), REWRITTEN)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .args(["--stdout", "clean.cpp"])
        .assert()
        .success()
        .stdout(REWRITTEN);
    Ok(())
}

#[test]
fn test_apply_with_json_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .args(["--apply", "--json", "cast.cpp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));

    assert_eq!(fs::read_to_string(dir.path().join("cast.cpp"))?, SOURCE);
    Ok(())
}

#[test]
fn test_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    let output = cmd
        .current_dir(dir.path())
        .args(["--json", "."])
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["files_scanned"], 1);
    assert_eq!(report["const_casts"], 1);
    assert_eq!(report["static_casts"], 1);
    assert_eq!(report["files"][0]["file"], "cast.cpp");
    Ok(())
}

#[test]
fn test_check_fails_when_rewrites_pending() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("cast.cpp"), SOURCE)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .args(["--check", "cast.cpp"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[CHECK]"));
    Ok(())
}

#[test]
fn test_check_passes_on_clean_sources() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("clean.cpp"), REWRITTEN)?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .args(["--check", "clean.cpp"])
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_missing_path_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    let mut cmd = Command::cargo_bin("castfix-bin")?;
    cmd.current_dir(dir.path())
        .arg("missing.cpp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}
