use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PlatformError;

/// Operating systems a parser library can be built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
  Linux,
  Darwin,
  Win32,
}

impl Os {
  /// Detect the current operating system at runtime
  pub fn current() -> Result<Self, PlatformError> {
    std::env::consts::OS.parse()
  }

  /// Returns the label used in artifact file names
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
      Self::Win32 => "win32",
    }
  }

  /// Returns the extension of a native shared library on this OS
  pub fn library_extension(&self) -> &'static str {
    match self {
      Self::Linux => "so",
      Self::Darwin => "dylib",
      Self::Win32 => "dll",
    }
  }

  pub fn is_windows(&self) -> bool {
    matches!(self, Self::Win32)
  }
}

impl FromStr for Os {
  type Err = PlatformError;

  /// Accepts `uname -s` style names as well as Rust's `std::env::consts::OS`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_ascii_lowercase();
    match lower.as_str() {
      "linux" => Ok(Self::Linux),
      "darwin" | "macos" => Ok(Self::Darwin),
      "win32" | "win64" | "windows" | "windows_nt" => Ok(Self::Win32),
      other if other.starts_with("mingw") || other.starts_with("msys") || other.starts_with("cygwin") => {
        Ok(Self::Win32)
      }
      _ => Err(PlatformError::UnsupportedPlatform(s.to_string())),
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
