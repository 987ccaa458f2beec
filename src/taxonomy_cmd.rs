//! `sw taxonomy` subcommands.
//!
//! Builds the taxonomy index from the strand store once per invocation and
//! answers frequency, lookup and listing queries.

use anyhow::{bail, Result};
use serde::Serialize;

use strandweave_core::taxonomy::{
    build_taxonomy_index, find_term_level, get_all_subjects, get_all_tags, get_all_topics,
    get_terms_by_frequency, TaxonomyLevel, TermEntry,
};

use crate::config::Config;
use crate::db;
use crate::store::SqliteStrandStore;

pub async fn run_top(
    config: &Config,
    level: TaxonomyLevel,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    if limit == Some(0) {
        bail!("--limit must be at least 1");
    }

    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);
    let index = build_taxonomy_index(Some(&store)).await;

    let limit = limit.unwrap_or(config.taxonomy.top_limit);
    let entries = get_terms_by_frequency(&index, level, Some(limit));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("No {} indexed.", level);
    } else {
        print_entries(&entries);
    }

    store.pool().close().await;
    Ok(())
}

fn print_entries(entries: &[&TermEntry]) {
    for (i, e) in entries.iter().enumerate() {
        println!(
            "{}. {} ({} document{})",
            i + 1,
            e.term,
            e.document_count,
            if e.document_count == 1 { "" } else { "s" }
        );
    }
}

#[derive(Serialize)]
struct LookupResponse<'a> {
    term: &'a str,
    level: TaxonomyLevel,
    document_count: usize,
    strand_paths: &'a [String],
}

pub async fn run_lookup(config: &Config, term: &str, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);
    let index = build_taxonomy_index(Some(&store)).await;

    match find_term_level(&index, term) {
        Some(m) => {
            if json {
                let resp = LookupResponse {
                    term: &m.entry.term,
                    level: m.level,
                    document_count: m.entry.document_count,
                    strand_paths: &m.entry.strand_paths,
                };
                println!("{}", serde_json::to_string_pretty(&resp)?);
            } else {
                println!("{}: {}", m.level, m.entry.term);
                println!("  documents: {}", m.entry.document_count);
                for p in &m.entry.strand_paths {
                    println!("    {}", p);
                }
            }
        }
        None => {
            if json {
                println!("null");
            } else {
                println!("Term not found: {}", term.trim());
            }
        }
    }

    store.pool().close().await;
    Ok(())
}

pub async fn run_list(config: &Config, level: TaxonomyLevel, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);
    let index = build_taxonomy_index(Some(&store)).await;

    let terms = match level {
        TaxonomyLevel::Subject => get_all_subjects(&index),
        TaxonomyLevel::Topic => get_all_topics(&index),
        TaxonomyLevel::Tag => get_all_tags(&index),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&terms)?);
    } else {
        for t in &terms {
            println!("{}", t);
        }
    }

    store.pool().close().await;
    Ok(())
}
