//! # Strandweave
//!
//! **A local-first knowledge graph for markdown digital gardens.**
//!
//! Content lives as markdown *strands*, grouped into a taxonomy of fabrics,
//! weaves and looms. Strandweave stores strand metadata in SQLite and
//! derives two views from it:
//!
//! - **Connections**: ranked pairwise relationships (shared tags and
//!   topics, same loom or weave, explicit references, content backlinks).
//! - **Taxonomy index**: an inverted index from subject/topic/tag terms to
//!   the strands that carry them.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────────────────┐
//! │ JSON import│──▶│ SQLite store │──▶│ strandweave-core     │
//! └────────────┘   │  (strands)   │   │ discovery + taxonomy │
//!                  └──────────────┘   └──────────┬───────────┘
//!                                                ▼
//!                                      ┌───────────────────┐
//!                                      │ CLI (sw) / export │
//!                                      └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! sw init                         # create database
//! sw import garden.json           # load strands
//! sw connections --min-strength 0.5
//! sw taxonomy top --level tags
//! sw export --output graph.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`models`] | Stored strand records |
//! | [`store`] | SQLite strand store and taxonomy row source |
//! | [`import`] | JSON import |
//! | [`export`] | JSON export of strands and connections |
//! | [`discover`] | `sw connections` / `sw shared` |
//! | [`taxonomy_cmd`] | `sw taxonomy` |
//! | [`stats`] | `sw stats` |

pub mod config;
pub mod db;
pub mod discover;
pub mod export;
pub mod import;
pub mod migrate;
pub mod models;
pub mod stats;
pub mod store;
pub mod taxonomy_cmd;
