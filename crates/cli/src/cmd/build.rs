//! `parsers build`: clone a grammar repository and build its libraries.
//!
//! The repository may be omitted when the language is in the catalog, in
//! which case both repository and ref (unless `--ref` is given) come from it.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Args;

use parsers_lib::build::{BuildRequest, build};
use parsers_lib::catalog::Catalog;
use parsers_lib::consts::ABI_VERSION_ENV;
use parsers_lib::tool::Toolchain;

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_info, print_json, print_stat, print_success, print_warning,
  symbols, truncate_hash,
};

#[derive(Args, Debug)]
pub struct BuildArgs {
  /// Language name; also the default variant name
  pub language: String,

  /// Git URL of the grammar repository
  pub repo_url: Option<String>,

  /// Branch or tag to build (defaults to the catalog's ref, then master)
  #[arg(long = "ref")]
  pub rev: Option<String>,

  /// Directory receiving the build outputs
  #[arg(long = "output", default_value = "artifacts")]
  pub output_dir: PathBuf,

  /// Target architecture (defaults to the host's)
  #[arg(long)]
  pub arch: Option<String>,

  /// Target platform: linux, darwin or win32 (defaults to the host's)
  #[arg(long)]
  pub platform: Option<String>,

  /// Accept a failing compiler as long as it produced the library
  #[arg(long)]
  pub cross_compile: bool,

  /// ABI version passed to the parser generator
  #[arg(long, env = ABI_VERSION_ENV)]
  pub abi_version: Option<String>,

  /// Output format
  #[arg(short, long, value_enum, default_value = "text")]
  pub format: OutputFormat,
}

/// Pick the repository and ref to build: explicit arguments win, then the
/// catalog, then `master` for the ref.
fn resolve_source(args: &BuildArgs, catalog: Option<&Path>) -> Result<(String, String)> {
  if let Some(repo) = &args.repo_url {
    let rev = args.rev.clone().unwrap_or_else(|| "master".to_string());
    return Ok((repo.clone(), rev));
  }

  let catalog = Catalog::load(catalog).context("Failed to load language catalog")?;
  let Some(entry) = catalog.get(&args.language) else {
    bail!(
      "no repository given for '{}' and it is not in the catalog; pass REPO_URL",
      args.language
    );
  };
  let rev = args.rev.clone().unwrap_or_else(|| entry.rev.clone());
  Ok((entry.repo.clone(), rev))
}

pub fn cmd_build(args: BuildArgs, catalog: Option<&Path>) -> Result<()> {
  let (repo_url, revision) = resolve_source(&args, catalog)?;

  let request = BuildRequest {
    language: args.language.clone(),
    repo_url,
    revision,
    output_dir: args.output_dir.clone(),
    arch: args.arch.clone(),
    platform: args.platform.clone(),
    cross_compile: args.cross_compile,
  };
  let toolchain = Toolchain::detect().with_abi_version(args.abi_version.clone());

  if !args.format.is_json() {
    print_info(&format!(
      "Building {} from {} @ {}",
      request.language, request.repo_url, request.revision
    ));
  }

  let start = Instant::now();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(build(&request, &toolchain))
    .with_context(|| format!("Failed to build {}", request.language))?;
  let elapsed = start.elapsed();

  for warning in &report.warnings {
    print_warning(warning);
  }

  if args.format.is_json() {
    return print_json(&report);
  }

  for output in &report.outputs {
    println!(
      "  {} {} {} ({})",
      output.variant,
      symbols::ARROW,
      output.path.display(),
      format_bytes(output.bytes)
    );
  }

  print_success(&format!(
    "Built {} ({}) at {}",
    report.language,
    report.variants().join(", "),
    truncate_hash(&report.commit)
  ));
  print_stat("Platform", &report.platform.label());
  print_stat("Duration", &format_duration(elapsed));
  Ok(())
}
