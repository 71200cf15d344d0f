//! External tool invocation.
//!
//! Every external program (parser generator, package manager, codesign,
//! storage CLI) runs through [`ToolInvocation`]: an explicit working
//! directory, the inherited environment plus overrides, captured output and an
//! optional wall-clock timeout.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::consts::GENERATOR_TOOL;
use crate::platform::Os;

#[derive(Debug, Error)]
pub enum ToolError {
  /// The program is not installed or not on PATH.
  #[error("required tool not found: {0}")]
  NotFound(String),

  /// The program could not be started.
  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program exited unsuccessfully.
  #[error("{command} failed with exit code {code:?}{}", format_stderr(.stderr))]
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },

  /// The program did not finish in time and was killed.
  #[error("{command} timed out after {}s", .timeout.as_secs())]
  TimedOut { command: String, timeout: Duration },
}

fn format_stderr(stderr: &str) -> String {
  match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
    Some(line) => format!(": {}", line.trim()),
    None => String::new(),
  }
}

/// A single external command.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
  pub program: PathBuf,
  pub args: Vec<OsString>,
  pub cwd: Option<PathBuf>,
  pub env: BTreeMap<String, String>,
  pub timeout: Option<Duration>,
  /// Indices into `args` that are masked in logs and errors.
  secret_args: Vec<usize>,
}

impl ToolInvocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: BTreeMap::new(),
      timeout: None,
      secret_args: Vec::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  /// Add an argument that must never be logged, e.g. a password.
  pub fn secret_arg(mut self, arg: impl Into<OsString>) -> Self {
    self.secret_args.push(self.args.len());
    self.args.push(arg.into());
    self
  }

  pub fn with_cwd(mut self, cwd: &Path) -> Self {
    self.cwd = Some(cwd.to_path_buf());
    self
  }

  pub fn with_env(mut self, key: &str, value: &str) -> Self {
    self.env.insert(key.to_string(), value.to_string());
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// Human readable command line, used in logs and errors.
  pub fn display(&self) -> String {
    let program = self
      .program
      .file_name()
      .map(|name| name.to_string_lossy().into_owned())
      .unwrap_or_else(|| self.program.display().to_string());
    let mut line = program;
    for (index, arg) in self.args.iter().enumerate() {
      line.push(' ');
      if self.secret_args.contains(&index) {
        line.push_str("***");
      } else {
        line.push_str(&arg.to_string_lossy());
      }
    }
    line
  }

  /// Run to completion and return trimmed stdout.
  pub async fn run(&self) -> Result<String, ToolError> {
    let command_line = self.display();
    info!(cmd = %command_line, "executing command");

    let mut command = Command::new(&self.program);
    command.args(&self.args).kill_on_drop(true);
    if let Some(cwd) = &self.cwd {
      command.current_dir(cwd);
    }
    for (key, value) in &self.env {
      command.env(key, value);
    }

    debug!(program = %self.program.display(), cwd = ?self.cwd, "spawning process");

    let output = match self.timeout {
      Some(timeout) => match tokio::time::timeout(timeout, command.output()).await {
        Ok(result) => result,
        Err(_) => {
          return Err(ToolError::TimedOut {
            command: command_line,
            timeout,
          });
        }
      },
      None => command.output().await,
    }
    .map_err(|source| {
      if source.kind() == std::io::ErrorKind::NotFound {
        ToolError::NotFound(self.program.display().to_string())
      } else {
        ToolError::Spawn {
          program: self.program.display().to_string(),
          source,
        }
      }
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
      if !stderr.is_empty() {
        debug!(stderr = %stderr, "command stderr");
      }
      if !stdout.is_empty() {
        debug!(stdout = %stdout, "command stdout");
      }

      return Err(ToolError::Failed {
        command: command_line,
        code: output.status.code(),
        stderr,
      });
    }

    if !stdout.is_empty() {
      debug!(stdout = %stdout, "command output");
    }

    Ok(stdout)
  }
}

/// How a WebAssembly module can be produced on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WasmSupport {
  Emscripten,
  Container,
  Unavailable,
}

/// External programs the builder may call, resolved once per build.
#[derive(Debug, Clone, Default)]
pub struct Toolchain {
  /// Parser generator CLI.
  pub generator: Option<PathBuf>,
  /// JavaScript package manager for grammar dependencies.
  pub npm: Option<PathBuf>,
  pub emcc: Option<PathBuf>,
  /// docker or podman.
  pub container_runtime: Option<PathBuf>,
  /// Parser ABI version passed to the generator.
  pub abi_version: Option<String>,
}

impl Toolchain {
  /// Look up every tool on PATH.
  pub fn detect() -> Self {
    let toolchain = Self {
      generator: which::which(GENERATOR_TOOL).ok(),
      npm: which::which("npm").ok(),
      emcc: which::which("emcc").ok(),
      container_runtime: which::which("docker").or_else(|_| which::which("podman")).ok(),
      abi_version: None,
    };
    debug!(?toolchain, "detected toolchain");
    toolchain
  }

  pub fn with_abi_version(mut self, abi_version: Option<String>) -> Self {
    self.abi_version = abi_version.filter(|v| !v.trim().is_empty());
    self
  }

  /// The generator, or `ToolError::NotFound` when it is not installed.
  pub fn require_generator(&self) -> Result<&Path, ToolError> {
    self
      .generator
      .as_deref()
      .ok_or_else(|| ToolError::NotFound(GENERATOR_TOOL.to_string()))
  }

  /// Container builds are never attempted on Windows hosts.
  pub fn wasm_support(&self, host: Os) -> WasmSupport {
    if self.generator.is_none() {
      return WasmSupport::Unavailable;
    }
    if self.emcc.is_some() {
      return WasmSupport::Emscripten;
    }
    if self.container_runtime.is_some() && !host.is_windows() {
      return WasmSupport::Container;
    }
    WasmSupport::Unavailable
  }
}
