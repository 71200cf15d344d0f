//! Parser generation and compilation through the generator CLI.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::BuildError;
use super::discover::GrammarUnit;
use crate::platform::{Os, Platform};
use crate::tool::{ToolError, ToolInvocation, Toolchain, WasmSupport};

/// Regenerate the parser sources. Returns `false` when no generator is
/// installed and the repository's pre-generated sources are used.
pub async fn generate(toolchain: &Toolchain, unit: &GrammarUnit) -> Result<bool, ToolError> {
  let Some(generator) = toolchain.generator.as_deref() else {
    warn!(variant = %unit.variant, "parser generator not found, using pre-generated sources");
    return Ok(false);
  };

  let mut invocation = ToolInvocation::new(generator).arg("generate").with_cwd(&unit.dir);
  if let Some(abi) = &toolchain.abi_version {
    invocation = invocation.arg("--abi").arg(abi.as_str());
  }

  invocation.run().await?;
  Ok(true)
}

/// Compiler flags selecting the target architecture when cross-compiling.
pub fn cross_compile_env(target: &Platform) -> Vec<(&'static str, String)> {
  if target.os != Os::Darwin {
    return Vec::new();
  }

  let flag = format!("-arch {}", target.arch.compiler_name());
  ["CFLAGS", "LDFLAGS"]
    .into_iter()
    .map(|key| {
      let value = match std::env::var(key) {
        Ok(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), flag),
        _ => flag.clone(),
      };
      (key, value)
    })
    .collect()
}

/// Compile the native shared library for `target`.
///
/// When cross-compiling, a failing tool run is accepted as long as the library
/// was written; the generator's post-build check cannot load foreign binaries.
pub async fn compile_native(
  toolchain: &Toolchain,
  unit: &GrammarUnit,
  target: &Platform,
  cross_compile: bool,
) -> Result<PathBuf, BuildError> {
  let variant = unit.variant.clone();
  let generator = toolchain
    .require_generator()
    .map_err(|source| BuildError::Compile {
      variant: variant.clone(),
      source,
    })?;

  let artifact = unit
    .dir
    .join(format!("{}.{}", unit.variant, target.os.library_extension()));
  remove_stale(&artifact)?;

  let mut invocation = ToolInvocation::new(generator)
    .arg("build")
    .arg("--output")
    .arg(&artifact)
    .with_cwd(&unit.dir);
  if cross_compile {
    for (key, value) in cross_compile_env(target) {
      invocation = invocation.with_env(key, &value);
    }
  }

  info!(variant = %variant, platform = %target, cross_compile, "compiling native library");

  match invocation.run().await {
    Ok(_) if artifact.is_file() => Ok(artifact),
    Ok(_) => Err(BuildError::MissingArtifact { variant, path: artifact }),
    Err(source) if cross_compile && artifact.is_file() => {
      warn!(variant = %variant, error = %source, "cross-compiled library failed verification, keeping it");
      Ok(artifact)
    }
    Err(source) => Err(BuildError::Compile { variant, source }),
  }
}

/// Build the WebAssembly module if this host can. Failures never abort the
/// build; the reason is returned instead.
pub async fn compile_wasm(toolchain: &Toolchain, unit: &GrammarUnit, host: Os) -> Result<PathBuf, String> {
  let Some(generator) = toolchain.generator.as_deref() else {
    let reason = format!("skipping wasm build for {}: parser generator not found", unit.variant);
    warn!(variant = %unit.variant, "{}", reason);
    return Err(reason);
  };

  let support = toolchain.wasm_support(host);
  if support == WasmSupport::Unavailable {
    let reason = format!(
      "skipping wasm build for {}: no emcc or container runtime available",
      unit.variant
    );
    warn!(variant = %unit.variant, "{}", reason);
    return Err(reason);
  }

  debug!(variant = %unit.variant, ?support, "compiling wasm module");

  let artifact = unit.dir.join(format!("{}.wasm", unit.variant));
  remove_stale(&artifact).map_err(|e| e.to_string())?;

  let result = ToolInvocation::new(generator)
    .args(["build", "--wasm", "--output"])
    .arg(&artifact)
    .with_cwd(&unit.dir)
    .run()
    .await;

  match result {
    Ok(_) if artifact.is_file() => Ok(artifact),
    Ok(_) => {
      let reason = format!("wasm build for {} produced no module", unit.variant);
      warn!(variant = %unit.variant, "{}", reason);
      Err(reason)
    }
    Err(e) => {
      let reason = format!("wasm build for {} failed: {}", unit.variant, e);
      warn!(variant = %unit.variant, error = %e, "wasm build failed");
      Err(reason)
    }
  }
}

fn remove_stale(path: &Path) -> Result<(), BuildError> {
  match fs::remove_file(path) {
    Ok(()) => {
      debug!(path = %path.display(), "removed stale artifact");
      Ok(())
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(source) => Err(BuildError::Io {
      path: path.to_path_buf(),
      source,
    }),
  }
}
