pub mod arch;
pub mod os;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use arch::Arch;
pub use os::Os;

#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("unsupported platform: '{0}' (expected linux, darwin or a Windows identifier)")]
  UnsupportedPlatform(String),
}

/// Build target combining OS and architecture (e.g. "linux-x64")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
  pub os: Os,
  pub arch: Arch,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(os: Os, arch: Arch) -> Self {
    Self { os, arch }
  }

  /// Detect the current platform at runtime
  pub fn current() -> Result<Self, PlatformError> {
    Ok(Self {
      os: Os::current()?,
      arch: Arch::current(),
    })
  }

  /// Resolve the target platform, preferring explicitly supplied values over
  /// the host. Each half falls back independently.
  pub fn resolve(platform: Option<&str>, arch: Option<&str>) -> Result<Self, PlatformError> {
    let os = match platform.filter(|p| !p.trim().is_empty()) {
      Some(name) => name.parse()?,
      None => Os::current()?,
    };
    let arch = match arch.filter(|a| !a.trim().is_empty()) {
      Some(name) => Arch::normalize(name),
      None => Arch::current(),
    };
    Ok(Self { os, arch })
  }

  /// Returns the "<os>-<arch>" label (e.g. "darwin-arm64")
  pub fn label(&self) -> String {
    format!("{}-{}", self.os, self.arch)
  }

  /// Returns the native library file name for this platform (e.g. "linux-x64.so")
  pub fn library_file_name(&self) -> String {
    format!("{}.{}", self.label(), self.os.library_extension())
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.label())
  }
}
