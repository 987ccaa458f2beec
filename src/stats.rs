//! Database statistics and health overview.
//!
//! Summarizes what's stored: strand counts, per-loom breakdown, taxonomy
//! term counts, and discovered connection totals. Used by `sw stats`.

use anyhow::Result;
use sqlx::Row;

use strandweave_core::connections::discover_connections;
use strandweave_core::taxonomy::build_taxonomy_index;

use crate::config::Config;
use crate::db;
use crate::store::SqliteStrandStore;

/// Per-loom breakdown of strand counts.
struct LoomStats {
    weave: String,
    loom: String,
    strand_count: i64,
    last_updated: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStrandStore::new(pool);

    let total_strands: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM strands")
        .fetch_one(store.pool())
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    let index = build_taxonomy_index(Some(&store)).await;
    let strands = store.load_strands().await?;
    let connection_count = discover_connections(&strands).len();

    println!("Strandweave — Database Stats");
    println!("============================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Strands:      {}", total_strands);
    println!("  Connections:  {}", connection_count);
    println!("  Subjects:     {}", index.subjects.len());
    println!("  Topics:       {}", index.topics.len());
    println!("  Tags:         {}", index.tags.len());

    let loom_rows = sqlx::query(
        r#"
        SELECT
            COALESCE(weave_slug, '-') AS weave,
            COALESCE(loom_slug, '-') AS loom,
            COUNT(*) AS strand_count,
            MAX(updated_at) AS last_updated
        FROM strands
        GROUP BY weave_slug, loom_slug
        ORDER BY strand_count DESC, weave, loom
        "#,
    )
    .fetch_all(store.pool())
    .await?;

    let loom_stats: Vec<LoomStats> = loom_rows
        .iter()
        .map(|row| LoomStats {
            weave: row.get("weave"),
            loom: row.get("loom"),
            strand_count: row.get("strand_count"),
            last_updated: row.get("last_updated"),
        })
        .collect();

    if !loom_stats.is_empty() {
        println!();
        println!("  By loom:");
        println!(
            "  {:<20} {:<20} {:>8}   {}",
            "WEAVE", "LOOM", "STRANDS", "LAST UPDATE"
        );
        println!("  {}", "-".repeat(68));

        for s in &loom_stats {
            println!(
                "  {:<20} {:<20} {:>8}   {}",
                s.weave,
                s.loom,
                s.strand_count,
                format_ts_relative(s.last_updated)
            );
        }
    }

    println!();

    store.pool().close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
