//! `parsers sign`: sign, package and optionally notarize macOS libraries.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;

use parsers_lib::sign::{NotarizeConfig, SignConfig, notarize, package_archive, sign_libraries};

use crate::output::{print_info, print_stat, print_success};

#[derive(Args, Debug)]
pub struct SignArgs {
  /// Output tree containing the .dylib files
  pub dir: PathBuf,

  /// Code signing identity
  #[arg(long, env = "APPLE_SIGNING_IDENTITY", hide_env_values = true)]
  pub identity: String,

  /// Zip archive to write the signed libraries into
  #[arg(long, default_value = "parsers-darwin.zip")]
  pub archive: PathBuf,

  /// Submit the archive to Apple's notary service
  #[arg(long)]
  pub notarize: bool,

  #[arg(long, env = "APPLE_ID", hide_env_values = true)]
  pub apple_id: Option<String>,

  #[arg(long, env = "APPLE_TEAM_ID", hide_env_values = true)]
  pub team_id: Option<String>,

  /// App-specific password
  #[arg(long, env = "APPLE_APP_PASSWORD", hide_env_values = true)]
  pub password: Option<String>,

  /// Time limit for each codesign call (e.g. "5m")
  #[arg(long, value_parser = humantime::parse_duration, default_value = "5m")]
  pub sign_timeout: Duration,

  /// Time limit for the notarization submission (e.g. "15m")
  #[arg(long, value_parser = humantime::parse_duration, default_value = "15m")]
  pub notarize_timeout: Duration,
}

fn notarize_config(args: &SignArgs) -> Result<NotarizeConfig> {
  let (Some(apple_id), Some(team_id), Some(password)) = (&args.apple_id, &args.team_id, &args.password) else {
    bail!("--notarize requires --apple-id, --team-id and --password (or APPLE_ID, APPLE_TEAM_ID, APPLE_APP_PASSWORD)");
  };

  let mut config = NotarizeConfig::new(apple_id, team_id, password);
  config.timeout = args.notarize_timeout;
  Ok(config)
}

pub fn cmd_sign(args: SignArgs) -> Result<()> {
  // Validate credentials before any signing work starts.
  let notarize_config = if args.notarize {
    Some(notarize_config(&args)?)
  } else {
    None
  };

  let mut sign_config = SignConfig::new(&args.identity);
  sign_config.timeout = args.sign_timeout;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(async {
    let signed = sign_libraries(&args.dir, &sign_config).await?;
    print_success(&format!("Signed {} libraries", signed.len()));

    package_archive(&args.dir, &args.archive)?;
    print_stat("Archive", &args.archive.display().to_string());

    if let Some(config) = &notarize_config {
      print_info("Waiting for notarization...");
      let verdict = notarize(&args.archive, config).await?;
      tracing::debug!(output = %verdict, "notary service response");
      print_success("Notarization accepted");
    }

    Ok::<(), anyhow::Error>(())
  })
}
