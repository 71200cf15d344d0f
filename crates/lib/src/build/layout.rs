//! Versioned output tree.
//!
//! ```text
//! <root>/<variant>/<commit>/<platform>-<arch>.<ext>
//! <root>/<variant>/<commit>/parser.wasm
//! <root>/<variant>/latest/...   (copy of the most recent non-empty commit dir)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::BuildError;
use crate::consts::LATEST_DIR;

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> BuildError + '_ {
  move |source| BuildError::Io {
    path: path.to_path_buf(),
    source,
  }
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
  root: PathBuf,
}

impl OutputLayout {
  /// Use `root` as-is. Callers are expected to pass an absolute path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Create `root` and pin it to an absolute path, so later path composition
  /// does not depend on the working directory.
  pub fn prepare(root: &Path) -> Result<Self, BuildError> {
    fs::create_dir_all(root).map_err(io_err(root))?;
    let root = dunce::canonicalize(root).map_err(io_err(root))?;
    debug!(root = %root.display(), "output root");
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn commit_dir(&self, variant: &str, commit: &str) -> PathBuf {
    self.root.join(variant).join(commit)
  }

  pub fn latest_dir(&self, variant: &str) -> PathBuf {
    self.root.join(variant).join(LATEST_DIR)
  }

  /// Create both the commit and the latest directory for `variant`.
  pub fn create_dirs(&self, variant: &str, commit: &str) -> Result<(PathBuf, PathBuf), BuildError> {
    let commit_dir = self.commit_dir(variant, commit);
    let latest_dir = self.latest_dir(variant);
    fs::create_dir_all(&commit_dir).map_err(io_err(&commit_dir))?;
    fs::create_dir_all(&latest_dir).map_err(io_err(&latest_dir))?;
    Ok((commit_dir, latest_dir))
  }

  /// Copy `source` into `dir` as `file_name`, returning the destination and its size.
  pub fn install(&self, source: &Path, dir: &Path, file_name: &str) -> Result<(PathBuf, u64), BuildError> {
    let dest = dir.join(file_name);
    let bytes = fs::copy(source, &dest).map_err(io_err(&dest))?;
    debug!(from = %source.display(), to = %dest.display(), bytes, "installed artifact");
    Ok((dest, bytes))
  }

  /// Replace `latest` with the contents of the commit directory.
  ///
  /// Returns `false`, leaving `latest` untouched, when the commit directory
  /// holds no files. The copies are staged next to `latest` and swapped in
  /// only once all of them succeeded.
  pub fn mirror_latest(&self, variant: &str, commit: &str) -> Result<bool, BuildError> {
    let commit_dir = self.commit_dir(variant, commit);
    let files = list_files(&commit_dir)?;
    if files.is_empty() {
      debug!(variant, commit, "nothing to mirror into latest");
      return Ok(false);
    }

    replace_with_copies(&files, &self.latest_dir(variant))?;

    debug!(variant, commit, files = files.len(), "mirrored into latest");
    Ok(true)
  }
}

fn copy_into(files: &[PathBuf], dir: &Path) -> Result<(), BuildError> {
  for file in files {
    if let Some(name) = file.file_name() {
      let dest = dir.join(name);
      fs::copy(file, &dest).map_err(io_err(&dest))?;
    }
  }
  Ok(())
}

/// Make `dest` a directory holding copies of `files`, and nothing else.
/// On error `dest` is left as it was.
fn replace_with_copies(files: &[PathBuf], dest: &Path) -> Result<(), BuildError> {
  let staging = dest.with_extension("partial");
  if staging.exists() {
    fs::remove_dir_all(&staging).map_err(io_err(&staging))?;
  }
  fs::create_dir_all(&staging).map_err(io_err(&staging))?;

  if let Err(e) = copy_into(files, &staging) {
    let _ = fs::remove_dir_all(&staging);
    return Err(e);
  }

  if dest.exists() {
    fs::remove_dir_all(dest).map_err(io_err(dest))?;
  }
  fs::rename(&staging, dest).map_err(io_err(dest))
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
  if !dir.exists() {
    return Ok(Vec::new());
  }

  let mut files = Vec::new();
  for entry in fs::read_dir(dir).map_err(io_err(dir))? {
    let entry = entry.map_err(io_err(dir))?;
    if entry.file_type().map_err(io_err(dir))?.is_file() {
      files.push(entry.path());
    }
  }
  files.sort();
  Ok(files)
}
