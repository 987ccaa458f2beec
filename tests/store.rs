//! SQLite store tests: upsert outcomes and taxonomy rows read back from disk.

use std::path::PathBuf;

use tempfile::TempDir;

use strandweave::config::{Config, DbConfig, DiscoveryConfig, LogConfig, TaxonomyConfig};
use strandweave::db;
use strandweave::migrate;
use strandweave::models::{StrandRecord, UpsertOutcome};
use strandweave::store::SqliteStrandStore;
use strandweave_core::cache::TaxonomyCache;
use strandweave_core::connections::{discover_connections, ConnectionType};
use strandweave_core::models::Strand;
use strandweave_core::taxonomy::{build_taxonomy_index, find_term_level, TaxonomyLevel};

fn test_config(dir: &TempDir) -> Config {
    Config {
        db: DbConfig {
            path: PathBuf::from(dir.path()).join("data/sw.sqlite"),
        },
        discovery: DiscoveryConfig::default(),
        taxonomy: TaxonomyConfig::default(),
        log: LogConfig::default(),
    }
}

async fn open_store(dir: &TempDir) -> SqliteStrandStore {
    let pool = db::connect(&test_config(dir)).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    SqliteStrandStore::new(pool)
}

fn record(strand: Strand) -> StrandRecord {
    StrandRecord::from(strand)
}

#[tokio::test]
async fn test_upsert_outcomes() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let doc = record(Strand::new("/doc1").with_tags(["rust"]));
    assert_eq!(store.upsert_strand(&doc).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(store.upsert_strand(&doc).await.unwrap(), UpsertOutcome::Unchanged);

    let edited = record(Strand::new("/doc1").with_tags(["rust", "async"]));
    assert_eq!(store.upsert_strand(&edited).await.unwrap(), UpsertOutcome::Updated);

    let loaded = store.get_strand("/doc1").await.unwrap().unwrap();
    assert_eq!(loaded.strand.tags, vec!["rust", "async"]);
    assert!(store.get_strand("/missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_strands_ordered_by_path() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    for p in ["/c", "/a", "/b"] {
        store.upsert_strand(&record(Strand::new(p))).await.unwrap();
    }

    let paths: Vec<String> = store
        .load_strands()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.path)
        .collect();
    assert_eq!(paths, vec!["/a", "/b", "/c"]);
}

#[tokio::test]
async fn test_taxonomy_index_from_store() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let doc1 = Strand::new("/doc1")
        .with_subjects(["Technology"])
        .with_topics(["AI"])
        .with_tags(["ml", "python"]);
    let doc2 = Strand::new("/doc2")
        .with_subjects(["Technology"])
        .with_tags(["python"]);
    store.upsert_strand(&record(doc1)).await.unwrap();
    store.upsert_strand(&record(doc2)).await.unwrap();

    let index = build_taxonomy_index(Some(&store)).await;

    let tech = &index.subjects["technology"];
    assert_eq!(tech.document_count, 2);
    assert_eq!(tech.strand_paths, vec!["/doc1", "/doc2"]);
    assert_eq!(index.topics["ai"].document_count, 1);
    assert_eq!(index.tags["python"].document_count, 2);
    assert_eq!(index.tags["ml"].strand_paths, vec!["/doc1"]);

    let m = find_term_level(&index, "PYTHON").unwrap();
    assert_eq!(m.level, TaxonomyLevel::Tag);
}

#[tokio::test]
async fn test_malformed_stored_field_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    sqlx::query(
        "INSERT INTO strands (path, subjects, topics, tags, content_hash, updated_at) \
         VALUES ('/broken', '[\"Science\"]', 'not json', '[\"lab\"]', 'x', 0)",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let index = build_taxonomy_index(Some(&store)).await;
    assert!(index.subjects.contains_key("science"));
    assert!(index.topics.is_empty());
    assert!(index.tags.contains_key("lab"));
}

#[tokio::test]
async fn test_cache_refresh_sees_new_rows() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;
    store
        .upsert_strand(&record(Strand::new("/a").with_tags(["one"])))
        .await
        .unwrap();

    let mut cache = TaxonomyCache::new();
    assert_eq!(cache.get_or_build(Some(&store), false).await.tags.len(), 1);

    store
        .upsert_strand(&record(Strand::new("/b").with_tags(["two"])))
        .await
        .unwrap();

    assert_eq!(cache.get_or_build(Some(&store), false).await.tags.len(), 1);
    assert_eq!(cache.get_or_build(Some(&store), true).await.tags.len(), 2);
}

#[tokio::test]
async fn test_stored_strands_feed_discovery() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp).await;

    let a = Strand::new("/a").with_loom("core").with_weave("frame");
    let mut b = Strand::new("/b").with_loom("core").with_weave("frame");
    b.relationships.references.push("/a".to_string());
    store.upsert_strand(&record(a)).await.unwrap();
    store.upsert_strand(&record(b)).await.unwrap();

    let conns = discover_connections(&store.load_strands().await.unwrap());
    let kinds: Vec<ConnectionType> = conns.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![ConnectionType::References, ConnectionType::SameLoom]);
    assert_eq!(conns[0].source, "/b");
    assert_eq!(conns[0].target, "/a");
}

#[tokio::test]
async fn test_connect_path_with_url_characters() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.db.path = tmp.path().join("odd?dir#1/sw.sqlite");

    let pool = db::connect(&config).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    let store = SqliteStrandStore::new(pool);
    store.upsert_strand(&record(Strand::new("/a"))).await.unwrap();
    store.pool().close().await;

    assert!(config.db.path.exists());
}
