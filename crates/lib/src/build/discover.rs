//! Grammar discovery inside a checked-out repository.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::consts::{DISCOVERY_EXCLUDES, GRAMMAR_FILE};

/// One grammar definition found in a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarUnit {
  pub grammar_file: PathBuf,
  /// Directory holding the grammar; every tool call for it runs here.
  pub dir: PathBuf,
  pub variant: String,
}

fn is_excluded(entry: &DirEntry) -> bool {
  entry.depth() > 0
    && entry.file_type().is_dir()
    && entry
      .file_name()
      .to_str()
      .is_some_and(|name| DISCOVERY_EXCLUDES.contains(&name))
}

/// Find every grammar definition below `root`, sorted by path.
pub fn discover_grammars(root: &Path, language: &str) -> Vec<GrammarUnit> {
  let mut units: Vec<GrammarUnit> = WalkDir::new(root)
    .follow_links(false)
    .into_iter()
    .filter_entry(|entry| !is_excluded(entry))
    .filter_map(|entry| match entry {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!(path = ?e.path(), error = %e, "skipping unreadable entry during grammar discovery");
        None
      }
    })
    .filter(|entry| entry.file_type().is_file() && entry.file_name() == GRAMMAR_FILE)
    .filter_map(|entry| {
      let grammar_file = entry.into_path();
      let dir = grammar_file.parent()?.to_path_buf();
      let variant = variant_name(root, &dir, language);
      Some(GrammarUnit {
        grammar_file,
        dir,
        variant,
      })
    })
    .collect();

  units.sort_by(|a, b| a.grammar_file.cmp(&b.grammar_file));
  debug!(root = %root.display(), count = units.len(), "discovered grammars");
  units
}

/// Name the outputs of the grammar in `dir` are published under.
///
/// Only the known multi-grammar layouts get their own names; everything else
/// is published as the requested language.
pub fn variant_name(root: &Path, dir: &Path, language: &str) -> String {
  if dir == root {
    return language.to_string();
  }

  match dir.file_name().and_then(|name| name.to_str()) {
    Some(name @ ("typescript" | "tsx")) => name.to_string(),
    Some("php_only") => "php".to_string(),
    _ => language.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::grammar_repo;
  use tempfile::TempDir;

  #[test]
  fn root_grammar_uses_language() {
    let temp = TempDir::new().unwrap();
    grammar_repo(temp.path(), &[""]);

    let units = discover_grammars(temp.path(), "python");
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].variant, "python");
    assert_eq!(units[0].dir, temp.path());
    assert_eq!(units[0].grammar_file, temp.path().join("grammar.js"));
  }

  #[test]
  fn typescript_repository_yields_two_variants() {
    let temp = TempDir::new().unwrap();
    grammar_repo(temp.path(), &["typescript", "tsx"]);

    let variants: Vec<_> = discover_grammars(temp.path(), "typescript")
      .into_iter()
      .map(|u| u.variant)
      .collect();
    assert_eq!(variants, vec!["tsx", "typescript"]);
  }

  #[test]
  fn php_only_maps_to_php() {
    let temp = TempDir::new().unwrap();
    grammar_repo(temp.path(), &["php", "php_only"]);

    let units = discover_grammars(temp.path(), "php");
    assert_eq!(units.len(), 2);
    assert!(units.iter().all(|u| u.variant == "php"));
    assert!(units[1].dir.ends_with("php_only"));
  }

  #[test]
  fn other_subdirectories_use_language() {
    let root = Path::new("/repo");
    assert_eq!(variant_name(root, &root.join("grammars/markdown"), "md"), "md");
    assert_eq!(variant_name(root, &root.join("typescript"), "ts"), "typescript");
    assert_eq!(variant_name(root, &root.join("tsx"), "ts"), "tsx");
    assert_eq!(variant_name(root, &root.join("php_only"), "php"), "php");
    assert_eq!(variant_name(root, root, "ocaml"), "ocaml");
  }

  #[test]
  fn dependency_and_build_caches_are_skipped() {
    let temp = TempDir::new().unwrap();
    grammar_repo(
      temp.path(),
      &["", "node_modules/tree-sitter-c", ".build/copy", "nested/node_modules/x"],
    );

    let units = discover_grammars(temp.path(), "cpp");
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].dir, temp.path());
  }

  #[test]
  fn empty_repository_has_no_grammars() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("README.md"), "# nothing").unwrap();
    assert!(discover_grammars(temp.path(), "python").is_empty());
  }

  #[test]
  #[cfg(unix)]
  fn unreadable_directory_does_not_hide_other_grammars() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    grammar_repo(temp.path(), &["", "locked"]);
    let locked = temp.path().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    let units = discover_grammars(temp.path(), "python");

    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    assert!(units.iter().any(|u| u.dir == temp.path()));
  }
}
