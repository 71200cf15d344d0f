use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::platform::{Platform, PlatformError};
use crate::tool::ToolError;

/// Errors that abort a build. Everything not listed here is a warning.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error(transparent)]
  Platform(#[from] PlatformError),

  #[error(transparent)]
  Fetch(#[from] FetchError),

  #[error("clone task failed: {0}")]
  Task(#[from] tokio::task::JoinError),

  #[error("failed to create build workspace: {0}")]
  Workspace(#[source] std::io::Error),

  #[error("no grammar.js found in {repo} at {rev}")]
  NoGrammarFound { repo: String, rev: String },

  #[error("failed to install grammar dependencies: {0}")]
  Dependencies(#[source] ToolError),

  #[error("failed to generate parser for {variant}: {source}")]
  Generate {
    variant: String,
    #[source]
    source: ToolError,
  },

  #[error("failed to compile {variant}: {source}")]
  Compile {
    variant: String,
    #[source]
    source: ToolError,
  },

  #[error("compiling {variant} reported success but produced no library at {path}")]
  MissingArtifact { variant: String, path: PathBuf },

  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// Inputs of one build job.
#[derive(Debug, Clone)]
pub struct BuildRequest {
  pub language: String,
  pub repo_url: String,
  /// Branch or tag to build.
  pub revision: String,
  pub output_dir: PathBuf,
  /// Target architecture; the host's when `None`.
  pub arch: Option<String>,
  /// Target platform; the host's when `None`.
  pub platform: Option<String>,
  pub cross_compile: bool,
}

impl BuildRequest {
  pub fn new(language: &str, repo_url: &str) -> Self {
    Self {
      language: language.to_string(),
      repo_url: repo_url.to_string(),
      revision: "master".to_string(),
      output_dir: PathBuf::from("artifacts"),
      arch: None,
      platform: None,
      cross_compile: false,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
  Native,
  Wasm,
}

/// One file written into the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
  pub variant: String,
  pub commit: String,
  pub platform: Platform,
  pub kind: ArtifactKind,
  pub file_name: String,
  /// Location under `<variant>/<commit>/`.
  pub path: PathBuf,
  /// Location under `<variant>/latest/`.
  pub latest_path: PathBuf,
  pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
  pub language: String,
  pub commit: String,
  pub platform: Platform,
  pub outputs: Vec<BuildOutput>,
  /// Non-fatal problems, e.g. a skipped WebAssembly build.
  pub warnings: Vec<String>,
}

impl BuildReport {
  pub fn variants(&self) -> Vec<&str> {
    let mut variants: Vec<&str> = self.outputs.iter().map(|o| o.variant.as_str()).collect();
    variants.dedup();
    variants
  }
}
