use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// CPU architecture labels used in artifact names
///
/// Unknown architectures are kept verbatim (lowercased) rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Arch {
  X64,
  Arm64,
  Arm,
  Other(String),
}

impl Arch {
  /// Detect the current CPU architecture at runtime
  pub fn current() -> Self {
    Self::normalize(std::env::consts::ARCH)
  }

  /// Map an architecture name or one of its synonyms to its label
  pub fn normalize(name: &str) -> Self {
    let lower = name.trim().to_ascii_lowercase();
    match lower.as_str() {
      "x86_64" | "amd64" | "x64" => Self::X64,
      "aarch64" | "arm64" => Self::Arm64,
      "armv7l" | "arm" => Self::Arm,
      _ => Self::Other(lower),
    }
  }

  /// Returns the label used in artifact file names
  pub fn as_str(&self) -> &str {
    match self {
      Self::X64 => "x64",
      Self::Arm64 => "arm64",
      Self::Arm => "arm",
      Self::Other(name) => name,
    }
  }

  /// Returns the name C compilers expect in `-arch` flags
  pub fn compiler_name(&self) -> &str {
    match self {
      Self::X64 => "x86_64",
      Self::Arm64 => "arm64",
      Self::Arm => "armv7",
      Self::Other(name) => name,
    }
  }
}

impl FromStr for Arch {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::normalize(s))
  }
}

impl From<String> for Arch {
  fn from(value: String) -> Self {
    Self::normalize(&value)
  }
}

impl From<Arch> for String {
  fn from(value: Arch) -> Self {
    value.as_str().to_string()
  }
}

impl fmt::Display for Arch {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
