//! Parser builds.
//!
//! One build takes a grammar repository at a revision and produces, for every
//! grammar definition in it, a native library and (when the host can) a
//! WebAssembly module in the versioned output tree:
//!
//! 1. resolve the target platform and pin the output root
//! 2. shallow-clone the repository into a temporary workspace
//! 3. discover grammars, install dependencies
//! 4. per grammar: generate, compile native, compile wasm, lay out outputs
//!
//! The first fatal error ends the build. Outputs already written for earlier
//! grammars stay on disk. The temporary workspace is removed on every exit.

pub mod compile;
pub mod discover;
pub mod layout;
mod types;

use std::path::Path;

use tracing::{info, warn};

pub use discover::{GrammarUnit, discover_grammars, variant_name};
pub use layout::OutputLayout;
pub use types::{ArtifactKind, BuildError, BuildOutput, BuildReport, BuildRequest};

use crate::consts::{DEPENDENCY_MANIFEST, WASM_FILE};
use crate::fetch::{self, Checkout};
use crate::platform::{Os, Platform};
use crate::tool::{ToolError, ToolInvocation, Toolchain};

/// Run one build job end to end.
pub async fn build(request: &BuildRequest, toolchain: &Toolchain) -> Result<BuildReport, BuildError> {
  build_in(request, toolchain, &std::env::temp_dir()).await
}

/// [`build`], with the temporary clone workspace created under `scratch`.
async fn build_in(request: &BuildRequest, toolchain: &Toolchain, scratch: &Path) -> Result<BuildReport, BuildError> {
  let target = Platform::resolve(request.platform.as_deref(), request.arch.as_deref())?;
  let layout = OutputLayout::prepare(&request.output_dir)?;

  let workspace = tempfile::Builder::new()
    .prefix("parsers-build-")
    .tempdir_in(scratch)
    .map_err(BuildError::Workspace)?;

  let url = request.repo_url.clone();
  let rev = request.revision.clone();
  let dest = workspace.path().join("repo");
  let checkout = tokio::task::spawn_blocking(move || fetch::shallow_clone(&url, &rev, &dest)).await??;

  info!(
    language = %request.language,
    commit = %checkout.commit,
    platform = %target,
    "building parsers"
  );

  build_checkout(&checkout, &request.language, &target, request.cross_compile, &layout, toolchain).await
}

/// Build every grammar in an existing checkout.
pub async fn build_checkout(
  checkout: &Checkout,
  language: &str,
  target: &Platform,
  cross_compile: bool,
  layout: &OutputLayout,
  toolchain: &Toolchain,
) -> Result<BuildReport, BuildError> {
  let units = discover_grammars(&checkout.path, language);
  if units.is_empty() {
    return Err(BuildError::NoGrammarFound {
      repo: checkout.url.clone(),
      rev: checkout.rev.clone(),
    });
  }

  install_dependencies(&checkout.path, toolchain).await?;

  let host = Os::current()?;
  let mut report = BuildReport {
    language: language.to_string(),
    commit: checkout.commit.clone(),
    platform: target.clone(),
    outputs: Vec::new(),
    warnings: Vec::new(),
  };

  for unit in &units {
    info!(variant = %unit.variant, grammar = %unit.grammar_file.display(), "building grammar");
    build_unit(unit, &checkout.commit, target, cross_compile, host, layout, toolchain, &mut report).await?;
  }

  info!(language, outputs = report.outputs.len(), "build complete");
  Ok(report)
}

async fn install_dependencies(root: &Path, toolchain: &Toolchain) -> Result<(), BuildError> {
  if !root.join(DEPENDENCY_MANIFEST).is_file() {
    return Ok(());
  }

  let npm = toolchain
    .npm
    .as_deref()
    .ok_or_else(|| BuildError::Dependencies(ToolError::NotFound("npm".to_string())))?;

  ToolInvocation::new(npm)
    .args(["install", "--ignore-scripts", "--omit=dev", "--no-audit", "--no-fund"])
    .with_cwd(root)
    .run()
    .await
    .map_err(BuildError::Dependencies)?;

  Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn build_unit(
  unit: &GrammarUnit,
  commit: &str,
  target: &Platform,
  cross_compile: bool,
  host: Os,
  layout: &OutputLayout,
  toolchain: &Toolchain,
  report: &mut BuildReport,
) -> Result<(), BuildError> {
  compile::generate(toolchain, unit)
    .await
    .map_err(|source| BuildError::Generate {
      variant: unit.variant.clone(),
      source,
    })?;

  let native = compile::compile_native(toolchain, unit, target, cross_compile).await?;
  let wasm = match compile::compile_wasm(toolchain, unit, host).await {
    Ok(path) => Some(path),
    Err(reason) => {
      report.warnings.push(reason);
      None
    }
  };

  let (commit_dir, latest_dir) = layout.create_dirs(&unit.variant, commit)?;

  let mut installed = vec![(ArtifactKind::Native, native, target.library_file_name())];
  if let Some(wasm) = wasm {
    installed.push((ArtifactKind::Wasm, wasm, WASM_FILE.to_string()));
  }

  for (kind, source, file_name) in installed {
    let (path, bytes) = layout.install(&source, &commit_dir, &file_name)?;
    report.outputs.push(BuildOutput {
      variant: unit.variant.clone(),
      commit: commit.to_string(),
      platform: target.clone(),
      kind,
      latest_path: latest_dir.join(&file_name),
      file_name,
      path,
      bytes,
    });
  }

  if !layout.mirror_latest(&unit.variant, commit)? {
    warn!(variant = %unit.variant, "no outputs produced, latest left unchanged");
  }

  Ok(())
}
