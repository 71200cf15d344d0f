//! `parsers upload`: publish an output tree to object storage.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use parsers_lib::upload::{UploadConfig, collect_artifacts, upload_all};

use crate::output::{OutputFormat, print_error, print_json, print_success, print_warning};

#[derive(Args, Debug)]
pub struct UploadArgs {
  /// Output tree to publish
  #[arg(default_value = "artifacts")]
  pub dir: PathBuf,

  /// Destination bucket
  #[arg(long, env = "PARSERS_BUCKET")]
  pub bucket: String,

  /// S3-compatible endpoint URL
  #[arg(long, env = "PARSERS_ENDPOINT_URL")]
  pub endpoint_url: Option<String>,

  /// Print the keys that would be uploaded without uploading
  #[arg(long)]
  pub dry_run: bool,

  /// Output format
  #[arg(short, long, value_enum, default_value = "text")]
  pub format: OutputFormat,
}

pub fn cmd_upload(args: UploadArgs) -> Result<()> {
  let artifacts = collect_artifacts(&args.dir)?;
  if artifacts.is_empty() {
    print_warning(&format!("No artifacts found under {}", args.dir.display()));
    return Ok(());
  }

  let mut config = UploadConfig::new(&args.bucket);
  config.endpoint_url = args.endpoint_url.clone();
  config.dry_run = args.dry_run;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt.block_on(upload_all(&artifacts, &config));

  if args.format.is_json() {
    print_json(&report)?;
  } else {
    let verb = if report.dry_run { "Would upload" } else { "Uploaded" };
    for key in &report.uploaded {
      println!("  {} s3://{}/{}", verb, config.bucket, key);
    }
    for failure in &report.failed {
      print_error(&format!("{}: {}", failure.key, failure.error));
    }
    if report.is_success() {
      print_success(&format!("{} {} files", verb, report.uploaded.len()));
    }
  }

  if !report.is_success() {
    bail!(
      "{} of {} uploads failed",
      report.failed.len(),
      report.failed.len() + report.uploaded.len()
    );
  }
  Ok(())
}
