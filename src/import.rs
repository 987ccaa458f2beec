//! Import strands from a JSON file.
//!
//! Accepts either a bare array of strand records or the `{ "strands": [...] }`
//! object written by `sw export`, so an export can be re-imported as-is.
//! Records are upserted by path; unchanged records are skipped.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::models::{StrandRecord, UpsertOutcome};
use crate::store::SqliteStrandStore;

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    List(Vec<serde_json::Value>),
    Export { strands: Vec<serde_json::Value> },
}

/// Counts reported by an import run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub records: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

/// Parse an import file into records. Records that fail to decode or have a
/// blank path are dropped and counted as skipped.
pub fn read_records(path: &Path) -> Result<(Vec<StrandRecord>, usize)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    parse_records(&content)
        .with_context(|| format!("Failed to parse import file: {}", path.display()))
}

fn parse_records(content: &str) -> Result<(Vec<StrandRecord>, usize)> {
    let values = match serde_json::from_str::<ImportFile>(content)
        .context("expected an array of strand records or an export object")?
    {
        ImportFile::List(values) => values,
        ImportFile::Export { strands } => strands,
    };

    let total = values.len();
    let mut valid = Vec::with_capacity(total);
    for (i, value) in values.into_iter().enumerate() {
        let record: StrandRecord = match serde_json::from_value(value) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(index = i, error = %e, "skipping malformed strand record");
                continue;
            }
        };
        if record.path().trim().is_empty() {
            tracing::warn!(index = i, "skipping strand record with empty path");
            continue;
        }
        valid.push(record);
    }
    let skipped = total - valid.len();
    Ok((valid, skipped))
}

/// Upsert records into the store, tallying outcomes.
pub async fn import_records(
    store: &SqliteStrandStore,
    records: &[StrandRecord],
) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        records: records.len(),
        ..ImportSummary::default()
    };

    for record in records {
        match store.upsert_strand(record).await? {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
            UpsertOutcome::Unchanged => summary.unchanged += 1,
        }
    }

    Ok(summary)
}

pub async fn run_import(config: &Config, file: &Path, dry_run: bool) -> Result<()> {
    let (records, skipped) = read_records(file)?;

    if dry_run {
        println!("import {} (dry-run)", file.display());
        println!("  records: {}", records.len());
        println!("  skipped: {}", skipped);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);
    let mut summary = import_records(&store, &records).await?;
    summary.skipped = skipped;

    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        unchanged = summary.unchanged,
        "import complete"
    );

    println!("import {}", file.display());
    println!("  records: {}", summary.records);
    println!("  inserted: {}", summary.inserted);
    println!("  updated: {}", summary.updated);
    println!("  unchanged: {}", summary.unchanged);
    println!("  skipped: {}", summary.skipped);
    println!("ok");

    store.pool().close().await;
    Ok(())
}
