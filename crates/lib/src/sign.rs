//! macOS code signing and notarization.
//!
//! Every `.dylib` in an output tree is signed and verified with `codesign`,
//! zipped, and submitted to Apple's notary service. Each external call runs
//! under a wall-clock timeout; any failure ends the job.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::info;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;

use crate::tool::{ToolError, ToolInvocation};
use crate::util::{files_with_extensions, relative_slash_path};

pub const SIGN_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const NOTARIZE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Error)]
pub enum SignError {
  #[error("no .dylib files found under {0}")]
  NoLibraries(PathBuf),

  #[error("failed to sign {path}: {source}")]
  Sign {
    path: PathBuf,
    #[source]
    source: ToolError,
  },

  #[error("signature verification failed for {path}: {source}")]
  Verify {
    path: PathBuf,
    #[source]
    source: ToolError,
  },

  #[error("failed to write archive {path}: {source}")]
  Archive {
    path: PathBuf,
    #[source]
    source: ZipError,
  },

  #[error("notarization failed: {0}")]
  Notarize(#[source] ToolError),
}

#[derive(Debug, Clone)]
pub struct SignConfig {
  /// Signing identity passed to `codesign --sign`.
  pub identity: String,
  pub codesign: PathBuf,
  pub timeout: Duration,
}

impl SignConfig {
  pub fn new(identity: &str) -> Self {
    Self {
      identity: identity.to_string(),
      codesign: PathBuf::from("codesign"),
      timeout: SIGN_TIMEOUT,
    }
  }
}

#[derive(Debug, Clone)]
pub struct NotarizeConfig {
  pub apple_id: String,
  pub team_id: String,
  /// App-specific password.
  pub password: String,
  pub xcrun: PathBuf,
  pub timeout: Duration,
}

impl NotarizeConfig {
  pub fn new(apple_id: &str, team_id: &str, password: &str) -> Self {
    Self {
      apple_id: apple_id.to_string(),
      team_id: team_id.to_string(),
      password: password.to_string(),
      xcrun: PathBuf::from("xcrun"),
      timeout: NOTARIZE_TIMEOUT,
    }
  }
}

/// Sign and verify every `.dylib` under `root`. Returns the signed files.
pub async fn sign_libraries(root: &Path, config: &SignConfig) -> Result<Vec<PathBuf>, SignError> {
  let libraries = files_with_extensions(root, &["dylib"]);
  if libraries.is_empty() {
    return Err(SignError::NoLibraries(root.to_path_buf()));
  }

  for library in &libraries {
    info!(path = %library.display(), "signing library");

    ToolInvocation::new(&config.codesign)
      .args(["--force", "--timestamp", "--options", "runtime", "--sign"])
      .arg(config.identity.as_str())
      .arg(library)
      .with_timeout(config.timeout)
      .run()
      .await
      .map_err(|source| SignError::Sign {
        path: library.clone(),
        source,
      })?;

    ToolInvocation::new(&config.codesign)
      .args(["--verify", "--strict", "--verbose=2"])
      .arg(library)
      .with_timeout(config.timeout)
      .run()
      .await
      .map_err(|source| SignError::Verify {
        path: library.clone(),
        source,
      })?;
  }

  Ok(libraries)
}

/// Zip every `.dylib` under `root` into `dest`, keeping paths relative to `root`.
pub fn package_archive(root: &Path, dest: &Path) -> Result<Vec<PathBuf>, SignError> {
  let libraries = files_with_extensions(root, &["dylib"]);
  if libraries.is_empty() {
    return Err(SignError::NoLibraries(root.to_path_buf()));
  }

  write_zip(root, &libraries, dest).map_err(|source| SignError::Archive {
    path: dest.to_path_buf(),
    source,
  })?;

  info!(archive = %dest.display(), files = libraries.len(), "packaged libraries");
  Ok(libraries)
}

fn write_zip(root: &Path, files: &[PathBuf], dest: &Path) -> Result<(), ZipError> {
  if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  let mut writer = ZipWriter::new(fs::File::create(dest)?);
  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .unix_permissions(0o755);

  for path in files {
    let name = relative_slash_path(root, path).unwrap_or_else(|| path.display().to_string());
    writer.start_file(name, options)?;
    let mut source = fs::File::open(path)?;
    io::copy(&mut source, &mut writer)?;
  }

  writer.finish()?;
  Ok(())
}

/// Submit `archive` to the notary service and wait for the verdict.
pub async fn notarize(archive: &Path, config: &NotarizeConfig) -> Result<String, SignError> {
  info!(archive = %archive.display(), "submitting for notarization");

  ToolInvocation::new(&config.xcrun)
    .args(["notarytool", "submit"])
    .arg(archive)
    .arg("--apple-id")
    .arg(config.apple_id.as_str())
    .arg("--team-id")
    .arg(config.team_id.as_str())
    .arg("--password")
    .secret_arg(config.password.as_str())
    .arg("--wait")
    .with_timeout(config.timeout)
    .run()
    .await
    .map_err(SignError::Notarize)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
  use super::*;
  use crate::util::testutil::write_tool;
  use tempfile::TempDir;

  fn output_tree(root: &Path) {
    for dir in ["python/abc/", "python/latest/"] {
      fs::create_dir_all(root.join(dir)).unwrap();
      fs::write(root.join(dir).join("darwin-arm64.dylib"), "lib").unwrap();
      fs::write(root.join(dir).join("parser.wasm"), "wasm").unwrap();
    }
  }

  #[tokio::test]
  async fn signs_and_verifies_every_dylib() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("artifacts");
    output_tree(&root);
    let log = temp.path().join("codesign.log");
    let codesign = write_tool(temp.path(), "codesign", &format!(r#"echo "$@" >> "{}""#, log.display()));

    let config = SignConfig {
      codesign,
      ..SignConfig::new("Developer ID Application: Example")
    };
    let signed = sign_libraries(&root, &config).await.unwrap();
    assert_eq!(signed.len(), 2);

    let calls = fs::read_to_string(&log).unwrap();
    let lines: Vec<_> = calls.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("--force --timestamp --options runtime --sign Developer ID Application: Example"));
    assert!(lines[1].starts_with("--verify --strict --verbose=2"));
    assert!(!calls.contains("parser.wasm"));
  }

  #[tokio::test]
  async fn verification_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("artifacts");
    output_tree(&root);
    let codesign = write_tool(
      temp.path(),
      "codesign",
      r#"if [ "$1" = --verify ]; then echo "invalid signature" >&2; exit 1; fi"#,
    );

    let config = SignConfig {
      codesign,
      ..SignConfig::new("-")
    };
    let result = sign_libraries(&root, &config).await;
    assert!(matches!(result, Err(SignError::Verify { .. })));
  }

  #[tokio::test]
  async fn signing_times_out() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("artifacts");
    output_tree(&root);
    let codesign = write_tool(temp.path(), "codesign", "sleep 5");

    let config = SignConfig {
      codesign,
      timeout: Duration::from_millis(100),
      ..SignConfig::new("-")
    };
    let result = sign_libraries(&root, &config).await;
    assert!(matches!(
      result,
      Err(SignError::Sign {
        source: ToolError::TimedOut { .. },
        ..
      })
    ));
  }

  #[tokio::test]
  async fn empty_tree_has_nothing_to_sign() {
    let temp = TempDir::new().unwrap();
    let result = sign_libraries(temp.path(), &SignConfig::new("-")).await;
    assert!(matches!(result, Err(SignError::NoLibraries(_))));
  }

  #[test]
  fn archive_contains_relative_dylib_paths() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("artifacts");
    output_tree(&root);
    let dest = temp.path().join("dist").join("parsers.zip");

    package_archive(&root, &dest).unwrap();

    let archive = zip::ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
    let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
      names,
      vec!["python/abc/darwin-arm64.dylib", "python/latest/darwin-arm64.dylib"]
    );
  }

  #[tokio::test]
  async fn notarization_masks_password_and_waits() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("xcrun.log");
    let xcrun = write_tool(temp.path(), "xcrun", &format!(r#"echo "$@" > "{}""#, log.display()));
    let archive = temp.path().join("parsers.zip");
    fs::write(&archive, "zip").unwrap();

    let config = NotarizeConfig {
      xcrun,
      ..NotarizeConfig::new("dev@example.com", "TEAM123", "app-password")
    };
    notarize(&archive, &config).await.unwrap();

    let args = fs::read_to_string(&log).unwrap();
    assert!(args.starts_with("notarytool submit"));
    assert!(args.contains("--apple-id dev@example.com --team-id TEAM123 --password app-password --wait"));
  }

  #[tokio::test]
  async fn notarization_failure_hides_password() {
    let temp = TempDir::new().unwrap();
    let xcrun = write_tool(temp.path(), "xcrun", r#"echo "status: Invalid" >&2; exit 1"#);

    let config = NotarizeConfig {
      xcrun,
      ..NotarizeConfig::new("dev@example.com", "TEAM123", "app-password")
    };
    let err = notarize(Path::new("parsers.zip"), &config).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("status: Invalid"));
    assert!(!message.contains("app-password"));
  }
}
