//! `parsers languages`: list the language catalog.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use parsers_lib::catalog::Catalog;

use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct LanguageRow<'a> {
  language: &'a str,
  repo: &'a str,
  #[serde(rename = "ref")]
  rev: &'a str,
}

pub fn cmd_languages(catalog: Option<&Path>, format: OutputFormat) -> Result<()> {
  let catalog = Catalog::load(catalog).context("Failed to load language catalog")?;

  if format.is_json() {
    let rows: Vec<LanguageRow> = catalog
      .iter()
      .map(|(language, entry)| LanguageRow {
        language,
        repo: &entry.repo,
        rev: &entry.rev,
      })
      .collect();
    return print_json(&rows);
  }

  println!("Languages ({}):", catalog.len());
  for (language, entry) in catalog.iter() {
    print_stat(language, &format!("{} @ {}", entry.repo, entry.rev));
  }
  Ok(())
}
