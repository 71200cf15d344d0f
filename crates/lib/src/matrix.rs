//! Build matrix planning.
//!
//! Expands a language selector and a platform selector into the ordered list
//! of build jobs. Each job is an independent (language, target) pair; the CI
//! system fans them out, nothing here runs them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::platform::{Arch, Os, Platform};

#[derive(Debug, Error)]
pub enum MatrixError {
  #[error("unknown platform selector '{0}' (expected all, linux, macos or windows)")]
  UnknownPlatformSelector(String),
}

/// One CI build target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDescriptor {
  /// CI runner image the job executes on.
  #[serde(rename = "os")]
  pub runner: &'static str,
  #[serde(rename = "platform")]
  pub os: Os,
  pub arch: Arch,
  /// The runner's native architecture differs from `arch`.
  pub cross_compile: bool,
  /// Architecture emulated on the runner (QEMU), if any.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emulation_arch: Option<Arch>,
}

impl TargetDescriptor {
  pub fn platform(&self) -> Platform {
    Platform::new(self.os, self.arch.clone())
  }
}

/// The fixed target set, in matrix order.
pub static TARGETS: [TargetDescriptor; 5] = [
  TargetDescriptor {
    runner: "ubuntu-latest",
    os: Os::Linux,
    arch: Arch::X64,
    cross_compile: false,
    emulation_arch: None,
  },
  TargetDescriptor {
    runner: "ubuntu-latest",
    os: Os::Linux,
    arch: Arch::Arm64,
    cross_compile: false,
    emulation_arch: Some(Arch::Arm64),
  },
  TargetDescriptor {
    runner: "macos-14",
    os: Os::Darwin,
    arch: Arch::Arm64,
    cross_compile: false,
    emulation_arch: None,
  },
  // macos-14 runners are arm64
  TargetDescriptor {
    runner: "macos-14",
    os: Os::Darwin,
    arch: Arch::X64,
    cross_compile: true,
    emulation_arch: None,
  },
  TargetDescriptor {
    runner: "windows-latest",
    os: Os::Win32,
    arch: Arch::X64,
    cross_compile: false,
    emulation_arch: None,
  },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageSelector {
  All,
  One(String),
}

impl FromStr for LanguageSelector {
  type Err = std::convert::Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(match s.trim() {
      "all" => Self::All,
      name => Self::One(name.to_string()),
    })
  }
}

impl fmt::Display for LanguageSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::All => write!(f, "all"),
      Self::One(name) => write!(f, "{}", name),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformSelector {
  #[default]
  All,
  Linux,
  Macos,
  Windows,
}

impl PlatformSelector {
  pub fn matches(&self, target: &TargetDescriptor) -> bool {
    match self {
      Self::All => true,
      Self::Linux => target.os == Os::Linux,
      Self::Macos => target.os == Os::Darwin,
      Self::Windows => target.os == Os::Win32,
    }
  }
}

impl FromStr for PlatformSelector {
  type Err = MatrixError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "all" => Ok(Self::All),
      "linux" | "linux-only" => Ok(Self::Linux),
      "macos" | "macos-only" | "darwin" => Ok(Self::Macos),
      "windows" | "windows-only" | "win32" => Ok(Self::Windows),
      _ => Err(MatrixError::UnknownPlatformSelector(s.to_string())),
    }
  }
}

impl fmt::Display for PlatformSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::All => "all",
      Self::Linux => "linux",
      Self::Macos => "macos",
      Self::Windows => "windows",
    };
    write!(f, "{}", name)
  }
}

/// One build job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatrixCell {
  pub language: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub repo: Option<String>,
  #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
  pub rev: Option<String>,
  #[serde(flatten)]
  pub target: TargetDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Matrix {
  pub include: Vec<MatrixCell>,
}

impl Matrix {
  pub fn len(&self) -> usize {
    self.include.len()
  }

  pub fn is_empty(&self) -> bool {
    self.include.is_empty()
  }

  /// Render as a GitHub Actions `strategy.matrix` value.
  pub fn to_github_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }
}

/// Expand the selectors into build jobs, language-major, targets in
/// [`TARGETS`] order.
///
/// A named language not present in the catalog still yields its cells, just
/// without repository information.
pub fn plan(catalog: &Catalog, languages: &LanguageSelector, platforms: PlatformSelector) -> Matrix {
  let selected: Vec<&str> = match languages {
    LanguageSelector::All => catalog.languages().collect(),
    LanguageSelector::One(name) => vec![name.as_str()],
  };

  let include = selected
    .into_iter()
    .flat_map(|language| {
      let entry = catalog.get(language);
      TARGETS
        .iter()
        .filter(move |target| platforms.matches(target))
        .map(move |target| MatrixCell {
          language: language.to_string(),
          repo: entry.map(|e| e.repo.clone()),
          rev: entry.map(|e| e.rev.clone()),
          target: target.clone(),
        })
    })
    .collect();

  Matrix { include }
}
