//! Artifact publishing.
//!
//! Uploads every library and WebAssembly module of an output tree to object
//! storage under `tree-sitter/parsers/tree-sitter-<path relative to root>`.
//! Uploads are independent: one failing file is recorded and the rest still
//! go out. Nothing is retried.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::consts::STORAGE_KEY_PREFIX;
use crate::tool::ToolInvocation;
use crate::util::{files_with_extensions, relative_slash_path};

/// Cache directive attached to every uploaded object.
pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Extensions of files that are published.
pub const ARTIFACT_EXTENSIONS: &[&str] = &["so", "dylib", "dll", "wasm"];

#[derive(Debug, Error)]
pub enum UploadError {
  #[error("artifact directory not found: {0}")]
  MissingRoot(PathBuf),
}

/// A file to publish and where it goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
  pub path: PathBuf,
  /// Path relative to the output root, `/`-separated.
  pub relative: String,
  pub key: String,
}

/// Remote key for a path relative to the output root.
pub fn storage_key(relative: &str) -> String {
  format!("{}{}", STORAGE_KEY_PREFIX, relative.trim_start_matches('/'))
}

/// Every publishable file under `root`, sorted by path.
pub fn collect_artifacts(root: &Path) -> Result<Vec<Artifact>, UploadError> {
  if !root.is_dir() {
    return Err(UploadError::MissingRoot(root.to_path_buf()));
  }

  Ok(
    files_with_extensions(root, ARTIFACT_EXTENSIONS)
      .into_iter()
      .filter_map(|path| {
        let relative = relative_slash_path(root, &path)?;
        Some(Artifact {
          key: storage_key(&relative),
          relative,
          path,
        })
      })
      .collect(),
  )
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
  pub bucket: String,
  /// S3-compatible endpoint, for non-AWS stores.
  pub endpoint_url: Option<String>,
  /// Storage CLI executable.
  pub cli: PathBuf,
  pub dry_run: bool,
}

impl UploadConfig {
  pub fn new(bucket: &str) -> Self {
    Self {
      bucket: bucket.to_string(),
      endpoint_url: None,
      cli: PathBuf::from("aws"),
      dry_run: false,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadFailure {
  pub key: String,
  pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadReport {
  pub uploaded: Vec<String>,
  pub failed: Vec<UploadFailure>,
  pub dry_run: bool,
}

impl UploadReport {
  pub fn is_success(&self) -> bool {
    self.failed.is_empty()
  }
}

fn upload_invocation(artifact: &Artifact, config: &UploadConfig) -> ToolInvocation {
  let mut invocation = ToolInvocation::new(&config.cli)
    .args(["s3", "cp"])
    .arg(&artifact.path)
    .arg(format!("s3://{}/{}", config.bucket, artifact.key))
    .arg("--metadata")
    .arg(format!("source-file={}", artifact.relative))
    .arg("--cache-control")
    .arg(CACHE_CONTROL);
  if let Some(endpoint) = &config.endpoint_url {
    invocation = invocation.arg("--endpoint-url").arg(endpoint.as_str());
  }
  invocation
}

/// Upload each artifact, continuing past failures.
pub async fn upload_all(artifacts: &[Artifact], config: &UploadConfig) -> UploadReport {
  let mut report = UploadReport {
    dry_run: config.dry_run,
    ..Default::default()
  };

  for artifact in artifacts {
    if config.dry_run {
      info!(key = %artifact.key, "would upload");
      report.uploaded.push(artifact.key.clone());
      continue;
    }

    match upload_invocation(artifact, config).run().await {
      Ok(_) => {
        info!(key = %artifact.key, "uploaded");
        report.uploaded.push(artifact.key.clone());
      }
      Err(e) => {
        warn!(key = %artifact.key, error = %e, "upload failed");
        report.failed.push(UploadFailure {
          key: artifact.key.clone(),
          error: e.to_string(),
        });
      }
    }
  }

  report
}
