//! Test utilities for parsers-lib.
//!
//! Cross-platform shell helpers and fake external tools. The fake tools are
//! small `/bin/sh` scripts, so tests using them are unix-only.

use std::path::{Path, PathBuf};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// What a fake build step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOutcome {
  /// Write the output file and exit 0.
  Succeed,
  /// Write the output file, then fail the self-check (exit 1).
  FailWithFile,
  /// Exit 1 without writing anything.
  FailWithoutFile,
}

impl FakeOutcome {
  fn script(&self) -> &'static str {
    match self {
      Self::Succeed => r#"printf 'binary' > "$out"; exit 0"#,
      Self::FailWithFile => r#"printf 'binary' > "$out"; echo "error: self-check failed" >&2; exit 1"#,
      Self::FailWithoutFile => r#"echo "error: compilation failed" >&2; exit 1"#,
    }
  }
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}

/// A fake parser generator.
///
/// - `generate ARGS` records ARGS in `generated.marker` in the cwd
/// - `build [--wasm] --output PATH` behaves per `native` / `wasm` and records
///   `$CFLAGS` in `cflags.txt` in the cwd
#[cfg(unix)]
pub fn fake_generator(dir: &Path, native: FakeOutcome, wasm: FakeOutcome) -> PathBuf {
  let body = format!(
    r#"cmd="$1"; shift
case "$cmd" in
  generate)
    echo "$@" > generated.marker
    exit 0
    ;;
  build)
    wasm=0
    out=""
    while [ $# -gt 0 ]; do
      case "$1" in
        --wasm) wasm=1 ;;
        --output) shift; out="$1" ;;
      esac
      shift
    done
    echo "$CFLAGS" > cflags.txt
    if [ "$wasm" = 1 ]; then
      {wasm}
    else
      {native}
    fi
    ;;
  *)
    echo "unknown command $cmd" >&2
    exit 2
    ;;
esac"#,
    native = native.script(),
    wasm = wasm.script(),
  );
  write_tool(dir, "tree-sitter", &body)
}

/// Initialise a git repository on `master` at `root` and commit everything in
/// it. Returns the full commit id.
pub fn commit_all(root: &Path) -> String {
  let git = |args: &[&str]| {
    let output = std::process::Command::new("git")
      .args([
        "-c",
        "user.name=parsers",
        "-c",
        "user.email=parsers@example.com",
        "-c",
        "commit.gpgsign=false",
        "-c",
        "init.defaultBranch=master",
      ])
      .args(args)
      .current_dir(root)
      .output()
      .unwrap();
    assert!(output.status.success(), "git {:?}: {}", args, String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).trim().to_string()
  };

  git(&["init", "--quiet"]);
  git(&["symbolic-ref", "HEAD", "refs/heads/master"]);
  git(&["add", "--all"]);
  git(&["commit", "--quiet", "-m", "grammar"]);
  git(&["rev-parse", "HEAD"])
}

/// Create a grammar repository layout: one `grammar.js` per entry of `dirs`,
/// where `""` is the repository root.
pub fn grammar_repo(root: &Path, dirs: &[&str]) {
  for dir in dirs {
    let dir = root.join(dir);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("grammar.js"), "module.exports = grammar({ name: 'x', rules: {} });\n").unwrap();
  }
}
