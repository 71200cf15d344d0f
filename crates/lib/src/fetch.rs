//! Shallow git checkout of grammar repositories.
//!
//! Every build starts from a fresh depth-1 clone of the requested revision in
//! an ephemeral directory. Nothing is cached between builds.

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur while checking out a grammar repository.
#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to clone a git repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// The revision is not a valid reference name.
  #[error("invalid revision '{rev}': {source}")]
  InvalidRevision {
    rev: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to checkout the working tree.
  #[error("failed to checkout revision '{rev}': {source}")]
  Checkout {
    rev: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to resolve HEAD reference.
  #[error("failed to resolve HEAD: {0}")]
  ResolveHead(String),
}

/// A checked-out grammar repository.
#[derive(Debug, Clone)]
pub struct Checkout {
  pub path: PathBuf,
  /// Repository the checkout was cloned from.
  pub url: String,
  /// Branch or tag that was requested.
  pub rev: String,
  /// Full hex commit id of the checked-out HEAD.
  pub commit: String,
}

/// Clone `url` at `rev` (a branch or tag name) into `dest` with depth 1.
///
/// `dest` must not exist or be empty.
pub fn shallow_clone(url: &str, rev: &str, dest: &Path) -> Result<Checkout, FetchError> {
  info!(url, rev, path = %dest.display(), "cloning repository");

  let prepared = gix::prepare_clone(url, dest)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?
    .with_shallow(gix::remote::fetch::Shallow::DepthAtRemote(NonZeroU32::MIN));

  let mut prepared = prepared.with_ref_name(Some(rev)).map_err(|e| FetchError::InvalidRevision {
    rev: rev.to_string(),
    source: Box::new(e),
  })?;

  let (mut checkout, _outcome) = prepared
    .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

  let (repo, _outcome) = checkout
    .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
    .map_err(|e| FetchError::Checkout {
      rev: rev.to_string(),
      source: Box::new(e),
    })?;

  let commit = head_commit(&repo)?;
  debug!(url, rev, commit = %commit, "resolved revision");

  Ok(Checkout {
    path: dest.to_path_buf(),
    url: url.to_string(),
    rev: rev.to_string(),
    commit,
  })
}

fn head_commit(repo: &gix::Repository) -> Result<String, FetchError> {
  let mut head = repo.head().map_err(|e| FetchError::ResolveHead(e.to_string()))?;

  let commit = head
    .peel_to_commit()
    .map_err(|e| FetchError::ResolveHead(e.to_string()))?;

  Ok(commit.id.to_string())
}

// Cloning is exercised end to end against local `file://` repositories in the
// builder tests.
