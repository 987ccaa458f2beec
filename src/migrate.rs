use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate_pool(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the schema on an open pool. Idempotent.
pub async fn migrate_pool(pool: &SqlitePool) -> Result<()> {
    // Taxonomy columns hold JSON-encoded string arrays, or NULL
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS strands (
            path TEXT PRIMARY KEY,
            title TEXT,
            fabric_slug TEXT,
            weave_slug TEXT,
            loom_slug TEXT,
            content TEXT NOT NULL DEFAULT '',
            subjects TEXT,
            topics TEXT,
            tags TEXT,
            relationships_json TEXT NOT NULL DEFAULT '{}',
            content_hash TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_strands_loom ON strands(loom_slug)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_strands_weave ON strands(weave_slug)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_strands_updated_at ON strands(updated_at DESC)")
        .execute(pool)
        .await?;

    Ok(())
}
