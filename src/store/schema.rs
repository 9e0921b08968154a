//! SQLite schema for the graph store.
//!
//! Contains edges are carried by `nodes.parent_id`; calls/inherits edges
//! live in `edges` with their resolution state. Search statistics are
//! stored as raw integer counts so incremental runs can apply deltas.

/// Executed with `CREATE … IF NOT EXISTS`, safe to replay on an existing
/// database.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );",
    "CREATE TABLE IF NOT EXISTS nodes (
        id TEXT PRIMARY KEY,
        parent_id TEXT,
        name TEXT NOT NULL,
        kind TEXT NOT NULL,
        line_start INTEGER NOT NULL DEFAULT 0,
        line_end INTEGER NOT NULL DEFAULT 0,
        signature TEXT,
        docstring TEXT,
        base_classes TEXT NOT NULL DEFAULT '[]',
        base_refs TEXT NOT NULL DEFAULT '[]'
    );",
    "CREATE TABLE IF NOT EXISTS edges (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        status TEXT NOT NULL,
        target_id TEXT,
        raw_name TEXT NOT NULL,
        candidates TEXT,
        receiver TEXT,
        line INTEGER
    );",
    "CREATE TABLE IF NOT EXISTS files (
        path TEXT PRIMARY KEY,
        hash TEXT NOT NULL,
        mtime INTEGER NOT NULL DEFAULT 0,
        indexed_at TEXT
    );",
    "CREATE TABLE IF NOT EXISTS search_terms (
        node_id TEXT NOT NULL,
        term TEXT NOT NULL,
        tf INTEGER NOT NULL,
        PRIMARY KEY (node_id, term)
    );",
    "CREATE TABLE IF NOT EXISTS term_stats (
        term TEXT PRIMARY KEY,
        df INTEGER NOT NULL
    );",
    "CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id);",
    "CREATE INDEX IF NOT EXISTS idx_nodes_name ON nodes(name);",
    "CREATE INDEX IF NOT EXISTS idx_nodes_kind ON nodes(kind);",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id);",
    "CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(kind);",
    "CREATE INDEX IF NOT EXISTS idx_search_term ON search_terms(term);",
];

/// Meta key: monotone counter bumped by every committed index run. Read
/// caches invalidate when it moves.
pub const META_EPOCH: &str = "epoch";

/// Meta key: number of search documents currently indexed.
pub const META_DOC_COUNT: &str = "doc_count";
