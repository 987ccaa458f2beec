use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn sw_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sw"))
}

const GARDEN: &str = r#"[
  {
    "path": "/weaves/frame/looms/core/intro.md",
    "title": "Introduction",
    "fabricSlug": "garden",
    "weaveSlug": "frame",
    "loomSlug": "core",
    "tags": ["Rust", "CLI"],
    "topics": ["Getting Started"],
    "subjects": ["Programming"],
    "content": "Start here, then read /weaves/frame/looms/core/ownership.md.",
    "relationships": { "seeAlso": ["/weaves/frame/looms/extras/tooling.md"] }
  },
  {
    "path": "/weaves/frame/looms/core/ownership.md",
    "title": "Ownership",
    "weaveSlug": "frame",
    "loomSlug": "core",
    "tags": ["rust", "memory"],
    "subjects": ["programming"],
    "relationships": { "prerequisites": ["/weaves/frame/looms/core/intro.md"] }
  },
  {
    "path": "/weaves/frame/looms/extras/tooling.md",
    "title": "Tooling",
    "weaveSlug": "frame",
    "loomSlug": "extras",
    "tags": ["cli", "cargo"],
    "topics": ["getting started"]
  },
  {
    "path": "/weaves/notes/looms/misc/unrelated.md",
    "weaveSlug": "notes",
    "loomSlug": "misc",
    "tags": ["gardening"],
    "subjects": ["Botany"]
  }
]"#;

fn setup_test_env() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let garden_path = root.join("garden.json");
    fs::write(&garden_path, GARDEN).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/sw.sqlite"

[log]
level = "warn"
"#,
        root.display()
    );

    let config_path = config_dir.join("sw.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path, garden_path)
}

fn run_sw(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = sw_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run sw binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn setup_imported() -> (TempDir, PathBuf, PathBuf) {
    let (tmp, config_path, garden_path) = setup_test_env();
    let (_, stderr, ok) = run_sw(&config_path, &["init"]);
    assert!(ok, "init failed: {}", stderr);
    let (_, stderr, ok) = run_sw(&config_path, &["import", garden_path.to_str().unwrap()]);
    assert!(ok, "import failed: {}", stderr);
    (tmp, config_path, garden_path)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path, _) = setup_test_env();

    let (stdout, stderr, success) = run_sw(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path, _) = setup_test_env();

    let (_, _, success1) = run_sw(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_sw(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_sw(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_import_and_reimport() {
    let (_tmp, config_path, garden_path) = setup_test_env();
    run_sw(&config_path, &["init"]);

    let garden = garden_path.to_str().unwrap();
    let (stdout, stderr, success) = run_sw(&config_path, &["import", garden]);
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("inserted: 4"), "got: {}", stdout);
    assert!(stdout.contains("ok"));

    let (stdout, _, _) = run_sw(&config_path, &["import", garden]);
    assert!(stdout.contains("inserted: 0"), "got: {}", stdout);
    assert!(stdout.contains("unchanged: 4"), "got: {}", stdout);
}

#[test]
fn test_import_dry_run() {
    let (_tmp, config_path, garden_path) = setup_test_env();
    run_sw(&config_path, &["init"]);

    let (stdout, _, success) = run_sw(
        &config_path,
        &["import", garden_path.to_str().unwrap(), "--dry-run"],
    );
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("records: 4"));

    let (stdout, _, _) = run_sw(&config_path, &["connections"]);
    assert!(stdout.contains("No connections."));
}

#[test]
fn test_connections_json() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, stderr, success) = run_sw(&config_path, &["connections", "--format", "json"]);
    assert!(success, "connections failed: {}", stderr);

    let conns: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(conns.len(), 10, "got: {}", stdout);

    assert_eq!(conns[0]["type"], "prerequisites");
    assert_eq!(conns[0]["source"], "/weaves/frame/looms/core/ownership.md");
    assert_eq!(conns[0]["target"], "/weaves/frame/looms/core/intro.md");

    let strengths: Vec<f64> = conns.iter().map(|c| c["strength"].as_f64().unwrap()).collect();
    for w in strengths.windows(2) {
        assert!(w[0] >= w[1], "not sorted: {:?}", strengths);
    }

    let same_loom = conns.iter().filter(|c| c["type"] == "sameLoom").count();
    let same_weave = conns.iter().filter(|c| c["type"] == "sameWeave").count();
    assert_eq!(same_loom, 1);
    assert_eq!(same_weave, 2);

    assert!(conns.iter().all(|c| {
        c["source"] != "/weaves/notes/looms/misc/unrelated.md"
            && c["target"] != "/weaves/notes/looms/misc/unrelated.md"
    }));
}

#[test]
fn test_connections_collection_format() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(
        &config_path,
        &["connections", "--format", "collection", "--min-strength", "0.5"],
    );
    assert!(success);
    let conns: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    // prerequisites, backlink, seeAlso, sameLoom
    assert_eq!(conns.len(), 4, "got: {}", stdout);
    assert!(conns.iter().all(|c| c["discovered"] == true));
    assert!(conns.iter().all(|c| c["label"].is_string()));
}

#[test]
fn test_connections_for_path() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(
        &config_path,
        &["connections", "--path", "/weaves/notes/looms/misc/unrelated.md"],
    );
    assert!(success);
    assert!(stdout.contains("No connections."));

    let (stdout, _, success) = run_sw(
        &config_path,
        &["connections", "--path", "/weaves/frame/looms/extras/tooling.md"],
    );
    assert!(success);
    assert!(stdout.contains("5 of 10 connections"), "got: {}", stdout);

    let (_, stderr, success) = run_sw(&config_path, &["connections", "--path", "/missing.md"]);
    assert!(!success);
    assert!(stderr.contains("strand not found"));
}

#[test]
fn test_shared_tags() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(&config_path, &["shared", "tags", "--json"]);
    assert!(success);
    let shared: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(shared.len(), 2, "got: {}", stdout);
    assert_eq!(shared["rust"].as_array().unwrap().len(), 2);
    assert_eq!(shared["cli"].as_array().unwrap().len(), 2);
    assert!(!shared.contains_key("gardening"));
}

#[test]
fn test_shared_topics_include_subjects() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(&config_path, &["shared", "topics"]);
    assert!(success);
    assert!(stdout.contains("programming (2)"), "got: {}", stdout);
    assert!(stdout.contains("getting started (2)"), "got: {}", stdout);
    assert!(!stdout.contains("botany"));
}

#[test]
fn test_taxonomy_top() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(
        &config_path,
        &["taxonomy", "top", "--level", "tags", "--limit", "2", "--json"],
    );
    assert!(success);
    let entries: Vec<serde_json::Value> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["document_count"], 2);
    assert_eq!(entries[1]["document_count"], 2);

    let (stdout, _, success) = run_sw(&config_path, &["taxonomy", "top"]);
    assert!(success);
    assert!(stdout.contains("1. programming (2 documents)"), "got: {}", stdout);
}

#[test]
fn test_taxonomy_lookup() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(&config_path, &["taxonomy", "lookup", "Getting Started"]);
    assert!(success);
    assert!(stdout.contains("topic: getting started"), "got: {}", stdout);
    assert!(stdout.contains("documents: 2"));

    let (stdout, _, success) = run_sw(&config_path, &["taxonomy", "lookup", "quantum"]);
    assert!(success);
    assert!(stdout.contains("Term not found"));
}

#[test]
fn test_taxonomy_list_rejects_unknown_level() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(&config_path, &["taxonomy", "list", "--level", "subjects"]);
    assert!(success);
    assert!(stdout.contains("programming"));
    assert!(stdout.contains("botany"));

    let (_, _, success) = run_sw(&config_path, &["taxonomy", "list", "--level", "looms"]);
    assert!(!success);
}

#[test]
fn test_stats() {
    let (_tmp, config_path, _) = setup_imported();

    let (stdout, _, success) = run_sw(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Strands:      4"), "got: {}", stdout);
    assert!(stdout.contains("Connections:  10"), "got: {}", stdout);
    assert!(stdout.contains("By loom:"));
}

#[test]
fn test_export_round_trips_through_import() {
    let (tmp, config_path, _) = setup_imported();
    let out = tmp.path().join("out/graph.json");

    let (_, stderr, success) = run_sw(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success);
    assert!(stderr.contains("Exported 4 strands, 10 connections"));

    let exported: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(exported["strands"].as_array().unwrap().len(), 4);
    assert_eq!(exported["connections"].as_array().unwrap().len(), 10);

    let (stdout, _, success) = run_sw(&config_path, &["import", out.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("unchanged: 4"), "got: {}", stdout);
}

#[test]
fn test_completions_without_config() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, success) = run_sw(&tmp.path().join("absent.toml"), &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("sw"));
}

#[test]
fn test_zero_limit_rejected() {
    let (_tmp, config_path, _) = setup_imported();

    let (_, stderr, success) = run_sw(&config_path, &["connections", "--limit", "0"]);
    assert!(!success);
    assert!(stderr.contains("--limit must be at least 1"), "got: {}", stderr);

    let (_, stderr, success) = run_sw(&config_path, &["taxonomy", "top", "--limit", "0"]);
    assert!(!success);
    assert!(stderr.contains("--limit must be at least 1"), "got: {}", stderr);
}

#[test]
fn test_import_tolerates_malformed_records() {
    let (tmp, config_path, _) = setup_test_env();
    run_sw(&config_path, &["init"]);

    let file = tmp.path().join("messy.json");
    fs::write(
        &file,
        r#"[
  {"path": "/a", "tags": null, "topics": "AI", "content": null},
  {"path": "/b", "tags": [1, 2]},
  {"path": "/c", "topics": ["ai"]}
]"#,
    )
    .unwrap();

    let (stdout, stderr, success) = run_sw(&config_path, &["import", file.to_str().unwrap()]);
    assert!(success, "import failed: {}", stderr);
    assert!(stdout.contains("inserted: 2"), "got: {}", stdout);
    assert!(stdout.contains("skipped: 1"), "got: {}", stdout);

    let (stdout, _, _) = run_sw(&config_path, &["taxonomy", "lookup", "ai"]);
    assert!(stdout.contains("documents: 2"), "got: {}", stdout);
}
