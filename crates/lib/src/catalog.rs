//! Language catalog.
//!
//! Maps each supported language key to the grammar repository it is built
//! from. A default catalog is compiled into the binary; a JSON file with the
//! same shape replaces it:
//!
//! ```json
//! { "python": { "repo": "https://github.com/tree-sitter/tree-sitter-python", "ref": "master" } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::CATALOG_ENV;

const EMBEDDED_CATALOG: &str = include_str!("../languages.json");

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("failed to read catalog '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid catalog '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid catalog: {0}")]
  Invalid(#[source] serde_json::Error),
}

/// Where a language's grammar comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
  pub repo: String,
  #[serde(rename = "ref", default = "default_ref")]
  pub rev: String,
}

fn default_ref() -> String {
  "master".to_string()
}

/// Ordered language table. Iteration order is the sorted language key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
  languages: BTreeMap<String, LanguageEntry>,
}

impl Catalog {
  /// The catalog compiled into the binary.
  pub fn embedded() -> Result<Self, CatalogError> {
    Self::from_json(EMBEDDED_CATALOG)
  }

  pub fn from_json(json: &str) -> Result<Self, CatalogError> {
    serde_json::from_str(json).map_err(CatalogError::Invalid)
  }

  pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Load the catalog from an explicit path, then `PARSERS_CATALOG`, then the
  /// embedded default.
  pub fn load(path: Option<&Path>) -> Result<Self, CatalogError> {
    if let Some(path) = path {
      debug!(path = %path.display(), "loading catalog");
      return Self::from_file(path);
    }

    if let Ok(path) = std::env::var(CATALOG_ENV) {
      debug!(path = %path, "loading catalog from {}", CATALOG_ENV);
      return Self::from_file(Path::new(&path));
    }

    Self::embedded()
  }

  pub fn get(&self, language: &str) -> Option<&LanguageEntry> {
    self.languages.get(language)
  }

  pub fn languages(&self) -> impl Iterator<Item = &str> {
    self.languages.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &LanguageEntry)> {
    self.languages.iter().map(|(name, entry)| (name.as_str(), entry))
  }

  pub fn len(&self) -> usize {
    self.languages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.languages.is_empty()
  }
}
