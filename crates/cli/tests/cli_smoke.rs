//! CLI smoke tests for parsers.
//!
//! None of these touch the network or require external build tools.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the parsers binary, isolated from the caller's env.
fn parsers_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("parsers");
  for var in [
    "PARSERS_CATALOG",
    "PARSERS_BUCKET",
    "PARSERS_ENDPOINT_URL",
    "APPLE_SIGNING_IDENTITY",
    "APPLE_ID",
    "APPLE_TEAM_ID",
    "APPLE_APP_PASSWORD",
    "TREE_SITTER_ABI_VERSION",
  ] {
    cmd.env_remove(var);
  }
  cmd
}

fn write_catalog(dir: &std::path::Path) -> std::path::PathBuf {
  let path = dir.join("catalog.json");
  std::fs::write(
    &path,
    r#"{
      "python": { "repo": "https://github.com/tree-sitter/tree-sitter-python" },
      "rust": { "repo": "https://github.com/tree-sitter/tree-sitter-rust", "ref": "v0.21.0" }
    }"#,
  )
  .unwrap();
  path
}

fn matrix_json(args: &[&str]) -> serde_json::Value {
  let output = parsers_cmd()
    .arg("matrix")
    .args(args)
    .args(["--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());
  serde_json::from_slice(&output.stdout).unwrap()
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  parsers_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  parsers_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("parsers"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build", "matrix", "sign", "upload", "languages", "info"] {
    parsers_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// Matrix
// =============================================================================

#[test]
fn matrix_single_language_linux() {
  let matrix = matrix_json(&["--language", "python", "--platform", "linux"]);
  let include = matrix["include"].as_array().unwrap();

  assert_eq!(include.len(), 2);
  assert!(include.iter().all(|cell| cell["language"] == "python"));
  assert!(include.iter().all(|cell| cell["platform"] == "linux"));
  assert_eq!(include[0]["arch"], "x64");
  assert_eq!(include[1]["arch"], "arm64");
}

#[test]
fn matrix_all_uses_embedded_catalog() {
  let matrix = matrix_json(&[]);
  assert_eq!(matrix["include"].as_array().unwrap().len(), 18 * 5);
}

#[test]
fn matrix_accepts_only_suffix() {
  let matrix = matrix_json(&["--language", "rust", "--platform", "macos-only"]);
  let include = matrix["include"].as_array().unwrap();

  assert_eq!(include.len(), 2);
  assert!(include.iter().all(|cell| cell["os"] == "macos-14"));
}

#[test]
fn matrix_respects_catalog_override() {
  let temp = TempDir::new().unwrap();
  let catalog = write_catalog(temp.path());

  let output = parsers_cmd()
    .arg("--catalog")
    .arg(&catalog)
    .args(["matrix", "--format", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let matrix: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(matrix["include"].as_array().unwrap().len(), 10);
}

#[test]
fn matrix_text_lists_jobs() {
  parsers_cmd()
    .args(["matrix", "--language", "go", "--platform", "windows"])
    .assert()
    .success()
    .stdout(predicate::str::contains("win32-x64"))
    .stdout(predicate::str::contains("1 jobs"));
}

#[test]
fn matrix_unknown_platform_fails() {
  parsers_cmd()
    .args(["matrix", "--platform", "beos"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("beos"));
}

// =============================================================================
// Languages
// =============================================================================

#[test]
fn languages_lists_catalog() {
  parsers_cmd()
    .arg("languages")
    .assert()
    .success()
    .stdout(predicate::str::contains("python"))
    .stdout(predicate::str::contains("tree-sitter-rust"));
}

#[test]
fn languages_bad_catalog_fails() {
  let temp = TempDir::new().unwrap();
  let catalog = temp.path().join("catalog.json");
  std::fs::write(&catalog, "not json").unwrap();

  parsers_cmd()
    .arg("--catalog")
    .arg(&catalog)
    .arg("languages")
    .assert()
    .failure();
}

// =============================================================================
// Build
// =============================================================================

#[test]
fn build_unknown_language_without_repo_fails() {
  let temp = TempDir::new().unwrap();

  parsers_cmd()
    .current_dir(temp.path())
    .args(["build", "klingon"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("klingon"));
}

#[test]
fn build_unsupported_platform_fails() {
  let temp = TempDir::new().unwrap();

  parsers_cmd()
    .current_dir(temp.path())
    .args(["build", "python", "https://example.invalid/grammar.git", "--platform", "solaris"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("solaris"));
}

// =============================================================================
// Sign & Upload
// =============================================================================

#[test]
fn sign_requires_identity() {
  let temp = TempDir::new().unwrap();

  parsers_cmd().arg("sign").arg(temp.path()).assert().failure();
}

#[test]
fn sign_empty_tree_fails() {
  let temp = TempDir::new().unwrap();

  parsers_cmd()
    .arg("sign")
    .arg(temp.path())
    .args(["--identity", "Developer ID Application: Example"])
    .assert()
    .failure()
    .stderr(predicate::str::contains(".dylib"));
}

#[test]
fn notarize_requires_credentials() {
  let temp = TempDir::new().unwrap();

  parsers_cmd()
    .arg("sign")
    .arg(temp.path())
    .args(["--identity", "Example", "--notarize"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--apple-id"));
}

#[test]
fn upload_dry_run_lists_keys() {
  let temp = TempDir::new().unwrap();
  let dir = temp.path().join("python").join("latest");
  std::fs::create_dir_all(&dir).unwrap();
  std::fs::write(dir.join("linux-x64.so"), "lib").unwrap();
  std::fs::write(dir.join("notes.txt"), "skip").unwrap();

  parsers_cmd()
    .arg("upload")
    .arg(temp.path())
    .args(["--bucket", "grammars", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains(
      "s3://grammars/tree-sitter/parsers/tree-sitter-python/latest/linux-x64.so",
    ))
    .stdout(predicate::str::contains("notes.txt").not());
}

#[test]
fn upload_missing_dir_fails() {
  let temp = TempDir::new().unwrap();

  parsers_cmd()
    .arg("upload")
    .arg(temp.path().join("nope"))
    .args(["--bucket", "grammars", "--dry-run"])
    .assert()
    .failure();
}
