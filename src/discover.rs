//! Connection discovery over stored strands.
//!
//! Backs `sw connections` and `sw shared`. Discovery itself is the pure
//! function in [`strandweave_core::connections`]; this module loads strands,
//! applies the display filters from config and flags, and prints.

use anyhow::{bail, Result};
use clap::ValueEnum;

use strandweave_core::connections::{
    analyze_shared_tags, analyze_shared_topics, connections_for, discover_connections,
    to_collection_connections, DiscoveredConnection,
};

use crate::config::Config;
use crate::db;
use crate::store::SqliteStrandStore;

/// Output shape for `sw connections`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectionsFormat {
    /// Human-readable list.
    Text,
    /// `DiscoveredConnection` JSON array.
    Json,
    /// `CollectionConnection` JSON array.
    Collection,
}

/// Which term pool `sw shared` analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SharedKind {
    Tags,
    Topics,
}

/// Display filters applied after discovery.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFilter {
    /// Keep only connections touching this strand.
    pub path: Option<String>,
    /// Overrides `discovery.min_strength`.
    pub min_strength: Option<f64>,
    /// Overrides `discovery.limit`.
    pub limit: Option<usize>,
}

/// Apply a filter to an already sorted connection list.
pub fn filter_connections(
    connections: &[DiscoveredConnection],
    filter: &ConnectionFilter,
    config: &Config,
) -> Vec<DiscoveredConnection> {
    let min_strength = filter
        .min_strength
        .unwrap_or(config.discovery.min_strength);
    let limit = filter.limit.unwrap_or(config.discovery.limit);

    let scoped: Vec<&DiscoveredConnection> = match filter.path.as_deref() {
        Some(path) => connections_for(path, connections),
        None => connections.iter().collect(),
    };

    scoped
        .into_iter()
        .filter(|c| c.strength >= min_strength)
        .take(limit)
        .cloned()
        .collect()
}

pub async fn run_connections(
    config: &Config,
    filter: &ConnectionFilter,
    format: ConnectionsFormat,
) -> Result<()> {
    if let Some(s) = filter.min_strength {
        if !(0.0..=1.0).contains(&s) {
            bail!("--min-strength must be in [0.0, 1.0]");
        }
    }
    if filter.limit == Some(0) {
        bail!("--limit must be at least 1");
    }

    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);

    if let Some(ref path) = filter.path {
        if store.get_strand(path).await?.is_none() {
            store.pool().close().await;
            bail!("strand not found: {}", path);
        }
    }

    let strands = store.load_strands().await?;
    let all = discover_connections(&strands);
    let selected = filter_connections(&all, filter, config);

    match format {
        ConnectionsFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&selected)?);
        }
        ConnectionsFormat::Collection => {
            let collection = to_collection_connections(&selected);
            println!("{}", serde_json::to_string_pretty(&collection)?);
        }
        ConnectionsFormat::Text => print_connections(&selected, all.len(), strands.len()),
    }

    store.pool().close().await;
    Ok(())
}

fn print_connections(selected: &[DiscoveredConnection], total: usize, strand_count: usize) {
    if selected.is_empty() {
        println!("No connections.");
        return;
    }

    println!(
        "{} of {} connections across {} strands",
        selected.len(),
        total,
        strand_count
    );
    println!();
    for (i, c) in selected.iter().enumerate() {
        println!("{}. [{:.2}] {} {} -> {}", i + 1, c.strength, c.kind, c.source, c.target);
        println!("    {}", c.reason);
    }
}

pub async fn run_shared(config: &Config, kind: SharedKind, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);
    let strands = store.load_strands().await?;

    let shared = match kind {
        SharedKind::Tags => analyze_shared_tags(&strands),
        SharedKind::Topics => analyze_shared_topics(&strands),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&shared)?);
    } else if shared.is_empty() {
        println!("No shared {}.", kind_label(kind));
    } else {
        for (term, paths) in &shared {
            println!("{} ({})", term, paths.len());
            for p in paths {
                println!("    {}", p);
            }
        }
    }

    store.pool().close().await;
    Ok(())
}

fn kind_label(kind: SharedKind) -> &'static str {
    match kind {
        SharedKind::Tags => "tags",
        SharedKind::Topics => "topics",
    }
}
