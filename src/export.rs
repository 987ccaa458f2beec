//! Export stored strands and their discovered connections as JSON.
//!
//! Connections are written in the collections shape
//! ([`CollectionConnection`]) so the web app can load them directly. The
//! output can be fed back to `sw import`.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use strandweave_core::connections::{
    discover_connections, to_collection_connections, CollectionConnection,
};

use crate::config::Config;
use crate::db;
use crate::models::StrandRecord;
use crate::store::SqliteStrandStore;

#[derive(Serialize)]
pub struct ExportData {
    pub exported_at: String,
    pub strands: Vec<StrandRecord>,
    pub connections: Vec<CollectionConnection>,
}

/// Assemble the export payload from a store.
pub async fn build_export(store: &SqliteStrandStore) -> Result<ExportData> {
    let strands = store.load_records().await?;
    let plain: Vec<_> = strands.iter().map(|r| r.strand.clone()).collect();
    let connections = to_collection_connections(&discover_connections(&plain));

    Ok(ExportData {
        exported_at: chrono::Utc::now().to_rfc3339(),
        strands,
        connections,
    })
}

/// Export strands and connections as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);

    let data = build_export(&store).await?;
    let strand_count = data.strands.len();
    let connection_count = data.connections.len();
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} strands, {} connections to {}",
                strand_count,
                connection_count,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }

    store.pool().close().await;
    Ok(())
}
