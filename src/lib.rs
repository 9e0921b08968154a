//! # CARTOGRAPH
//!
//! Navigable, queryable structural graph of a source codebase.
//!
//! Cartograph indexes a project into a persisted entity/relationship graph
//! (directories, files, classes, functions, call and inheritance edges)
//! with a TF-IDF keyword index, so an automated agent can explore a
//! codebase incrementally instead of reading it wholesale.
//!
//! ## Operations
//!
//! - **index**: full or incremental graph build with content-hash diffing
//! - **map / expand / inspect / hierarchy**: structural navigation
//! - **search**: ranked keyword lookup over names, signatures, docstrings
//! - **read**: raw source access, confined to the project root
//!
//! ## Supported Languages
//!
//! Python, Rust, JavaScript, TypeScript, Go, Java

pub mod core;
pub mod errors;
pub mod extractors;
pub mod query;
pub mod search;
pub mod store;

pub use crate::core::{IndexReport, Indexer};
pub use crate::errors::{Error, Result};
pub use crate::extractors::ExtractorRegistry;
pub use crate::query::Navigator;
pub use crate::store::GraphStore;

/// File name of the index database inside the project root.
pub const DB_FILE_NAME: &str = ".cartograph.db";
