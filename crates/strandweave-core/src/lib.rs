//! # Strandweave Core
//!
//! Shared, WASM-safe logic for strandweave: strand models, connection
//! discovery, the taxonomy index and its cache, and the row-source trait
//! the index is built from.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Storage backends live in the `strandweave`
//! app crate and plug in through [`source::TaxonomySource`].

pub mod cache;
pub mod connections;
pub mod models;
pub mod source;
pub mod taxonomy;
