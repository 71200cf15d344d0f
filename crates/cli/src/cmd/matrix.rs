//! `parsers matrix`: expand selectors into CI build jobs.
//!
//! JSON output is the compact `{"include": [...]}` object a GitHub Actions
//! `strategy.matrix` consumes; text output is one job per line.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use parsers_lib::catalog::Catalog;
use parsers_lib::matrix::{LanguageSelector, Matrix, PlatformSelector, plan};

use crate::output::OutputFormat;

pub fn cmd_matrix(
  language: &LanguageSelector,
  platform: PlatformSelector,
  catalog: Option<&Path>,
  format: OutputFormat,
) -> Result<()> {
  let catalog = Catalog::load(catalog).context("Failed to load language catalog")?;
  let matrix = plan(&catalog, language, platform);
  tracing::debug!(
    language = %language,
    platform = %platform,
    jobs = matrix.len(),
    "planned build matrix"
  );

  if format.is_json() {
    let json = matrix.to_github_json().context("Failed to serialize matrix")?;
    println!("{}", json);
  } else {
    print_text(&matrix);
  }
  Ok(())
}

fn print_text(matrix: &Matrix) {
  for cell in &matrix.include {
    let target = &cell.target;
    let mut notes = Vec::new();
    if target.cross_compile {
      notes.push("cross-compile".to_string());
    }
    if let Some(emulated) = &target.emulation_arch {
      notes.push(format!("emulated {}", emulated));
    }
    if cell.repo.is_none() {
      notes.push("not in catalog".to_string());
    }

    let notes = if notes.is_empty() {
      String::new()
    } else {
      format!(" ({})", notes.join(", "))
    };

    println!(
      "{:<12} {:<14} {}{}",
      cell.language,
      target.platform().label(),
      target.runner.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      notes
    );
  }
  println!("{} jobs", matrix.len());
}
