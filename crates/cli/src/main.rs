mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{BuildArgs, SignArgs, UploadArgs};
use crate::output::{OutputFormat, print_error};
use parsers_lib::matrix::{LanguageSelector, PlatformSelector};

/// parsers - build and publish grammar parser libraries
#[derive(Parser)]
#[command(name = "parsers")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose (debug) logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Language catalog (JSON) replacing the built-in one
  #[arg(long, global = true, env = "PARSERS_CATALOG")]
  catalog: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Clone a grammar repository and build its parser libraries
  Build(BuildArgs),

  /// Expand language/platform selectors into CI build jobs
  Matrix {
    /// Language to build, or "all" for every catalog language
    #[arg(short, long, default_value = "all")]
    language: LanguageSelector,

    /// Platforms to build: all, linux, macos or windows
    #[arg(short, long, default_value = "all")]
    platform: PlatformSelector,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Sign (and optionally notarize) macOS libraries
  Sign(SignArgs),

  /// Upload built libraries to object storage
  Upload(UploadArgs),

  /// List languages in the catalog
  Languages {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
  },

  /// Show host platform and detected tools
  Info,
}

fn init_tracing(verbose: bool) {
  let filter = if verbose && std::env::var_os("RUST_LOG").is_none() {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let catalog = cli.catalog.as_deref();
  let result = match cli.command {
    Commands::Build(args) => cmd::cmd_build(args, catalog),
    Commands::Matrix {
      language,
      platform,
      format,
    } => cmd::cmd_matrix(&language, platform, catalog, format),
    Commands::Sign(args) => cmd::cmd_sign(args),
    Commands::Upload(args) => cmd::cmd_upload(args),
    Commands::Languages { format } => cmd::cmd_languages(catalog, format),
    Commands::Info => cmd::cmd_info(),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      print_error(&format!("{:#}", e));
      ExitCode::FAILURE
    }
  }
}
