//! Shared utilities.
//!
//! Filesystem helpers used by the builder and the publishing steps, plus test
//! helpers.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

#[cfg(test)]
pub mod testutil;

/// All regular files below `root` whose extension is in `extensions`, sorted.
pub fn files_with_extensions(root: &Path, extensions: &[&str]) -> Vec<PathBuf> {
  let mut files: Vec<PathBuf> = WalkDir::new(root)
    .follow_links(false)
    .into_iter()
    .filter_map(|entry| match entry {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!(path = ?e.path(), error = %e, "skipping unreadable entry");
        None
      }
    })
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| entry.into_path())
    .filter(|path| {
      path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
    })
    .collect();
  files.sort();
  files
}

/// `path` relative to `root` with `/` separators on every platform.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
  let relative = path.strip_prefix(root).ok()?;
  let parts: Vec<_> = relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy().into_owned())
    .collect();
  Some(parts.join("/"))
}
