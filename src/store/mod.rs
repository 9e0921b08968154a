//! Transactional SQLite store for the entity/relationship graph.
//!
//! A single mutex-guarded connection serializes all access: a write
//! transaction holds the guard for an entire index run, so concurrent
//! readers observe either the pre-run or the post-run graph, never a mix.

pub mod schema;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::graph::{
    validate_forest, Edge, EdgeKind, EdgeStatus, FileFingerprint, Node, NodeKind,
};
use crate::errors::{Error, Result};

pub struct GraphStore {
    conn: Mutex<Connection>,
}

/// Aggregate entity counts for a subtree.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SubtreeStats {
    pub files: i64,
    pub classes: i64,
    pub functions: i64,
    pub methods: i64,
}

/// One row of the resolver's symbol table.
#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub file_path: String,
    /// Name of the enclosing class-like node, when the parent is one.
    pub enclosing_class: Option<String>,
}

impl GraphStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL is a no-op for in-memory databases; the pragma still succeeds.
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        for stmt in schema::SCHEMA_STATEMENTS {
            conn.execute_batch(stmt)?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside one transaction. Commit on `Ok`, roll back on `Err` —
    /// a failed run leaves the previously committed graph untouched.
    pub fn write<T>(&self, f: impl FnOnce(&WriteTxn<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let writer = WriteTxn { tx };
        match f(&writer) {
            Ok(value) => {
                writer.tx.commit()?;
                Ok(value)
            }
            // Dropping the transaction rolls it back.
            Err(err) => Err(err),
        }
    }

    // -- reads --------------------------------------------------------------

    pub fn node(&self, id: &str) -> Result<Option<Node>> {
        let conn = self.conn.lock();
        get_node(&conn, id)
    }

    pub fn children(&self, id: &str) -> Result<Vec<Node>> {
        let conn = self.conn.lock();
        query_nodes(
            &conn,
            "SELECT * FROM nodes WHERE parent_id = ?1 ORDER BY kind, id",
            params![id],
        )
    }

    /// Entity counts over a node and all its descendants, via recursive CTE.
    pub fn subtree_stats(&self, id: &str) -> Result<SubtreeStats> {
        let conn = self.conn.lock();
        subtree_stats(&conn, id)
    }

    pub fn fingerprints(&self) -> Result<Vec<FileFingerprint>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT path, hash, mtime FROM files ORDER BY path")?;
        let rows = stmt.query_map([], |row| {
            Ok(FileFingerprint {
                path: row.get(0)?,
                hash: row.get(1)?,
                mtime: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn edges_from(&self, id: &str) -> Result<Vec<Edge>> {
        let conn = self.conn.lock();
        query_edges(
            &conn,
            "SELECT source_id, kind, status, target_id, raw_name, candidates, receiver, line
             FROM edges WHERE source_id = ?1 ORDER BY kind, line, raw_name",
            params![id],
        )
    }

    /// Edges pointing at `id`: resolved targets plus ambiguous edges that
    /// list it as a candidate.
    pub fn edges_to(&self, id: &str) -> Result<Vec<Edge>> {
        let conn = self.conn.lock();
        let candidate_pattern = format!("%\"{}\"%", id);
        query_edges(
            &conn,
            "SELECT source_id, kind, status, target_id, raw_name, candidates, receiver, line
             FROM edges
             WHERE target_id = ?1 OR (status = 'ambiguous' AND candidates LIKE ?2)
             ORDER BY source_id, line",
            params![id, candidate_pattern],
        )
    }

    /// Inherits edges referencing `class_name`, by resolved target name or
    /// by raw text, paired with their source nodes.
    pub fn subclass_edges(&self, class_name: &str) -> Result<Vec<(Node, Edge)>> {
        let conn = self.conn.lock();
        let edges = query_edges(
            &conn,
            "SELECT source_id, kind, status, target_id, raw_name, candidates, receiver, line
             FROM edges
             WHERE kind = 'inherits'
               AND (raw_name = ?1
                    OR target_id IN (SELECT id FROM nodes WHERE name = ?1))
             ORDER BY source_id",
            params![class_name],
        )?;
        let mut out = Vec::new();
        for edge in edges {
            if let Some(node) = get_node(&conn, &edge.source_id)? {
                out.push((node, edge));
            }
        }
        Ok(out)
    }

    /// Symbol table rows: every class-like and function-like node with its
    /// enclosing class, ordered by id for determinism.
    pub fn symbol_entries(&self) -> Result<Vec<SymbolEntry>> {
        let conn = self.conn.lock();
        symbol_entries(&conn)
    }

    pub fn epoch(&self) -> Result<i64> {
        let conn = self.conn.lock();
        meta_i64(&conn, schema::META_EPOCH)
    }

    pub fn doc_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        meta_i64(&conn, schema::META_DOC_COUNT)
    }

    pub fn term_df(&self, term: &str) -> Result<i64> {
        let conn = self.conn.lock();
        let df: Option<i64> = conn
            .query_row(
                "SELECT df FROM term_stats WHERE term = ?1",
                params![term],
                |row| row.get(0),
            )
            .optional()?;
        Ok(df.unwrap_or(0))
    }

    /// `(node_id, tf)` postings for one term.
    pub fn term_postings(&self, term: &str) -> Result<Vec<(String, i64)>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT node_id, tf FROM search_terms WHERE term = ?1 ORDER BY node_id")?;
        let rows = stmt.query_map(params![term], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Startup consistency check: the Contains forest must be rooted and
    /// acyclic, every fingerprint must have its file node, and every edge
    /// source must exist. Violations surface as `Error::Corrupt`.
    pub fn validate(&self) -> Result<()> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare("SELECT id, parent_id FROM nodes")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })?;
        let mut pairs: Vec<(String, Option<String>)> = Vec::new();
        for row in rows {
            pairs.push(row?);
        }
        validate_forest(
            pairs
                .iter()
                .map(|(id, parent)| (id.as_str(), parent.as_deref())),
        )?;

        let orphan_fingerprint: Option<String> = conn
            .query_row(
                "SELECT path FROM files
                 WHERE path NOT IN (SELECT id FROM nodes WHERE kind = 'file') LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(path) = orphan_fingerprint {
            return Err(Error::Corrupt(format!(
                "fingerprint without file node: {path}"
            )));
        }

        let dangling_source: Option<String> = conn
            .query_row(
                "SELECT source_id FROM edges
                 WHERE source_id NOT IN (SELECT id FROM nodes) LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(source) = dangling_source {
            return Err(Error::Corrupt(format!("edge with missing source: {source}")));
        }

        Ok(())
    }
}

/// Write handle bound to one transaction. All mutation goes through here.
pub struct WriteTxn<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl WriteTxn<'_> {
    pub fn clear_graph(&self) -> Result<()> {
        self.tx.execute_batch(
            "DELETE FROM nodes;
             DELETE FROM edges;
             DELETE FROM files;
             DELETE FROM search_terms;
             DELETE FROM term_stats;",
        )?;
        self.set_meta_i64(schema::META_DOC_COUNT, 0)?;
        Ok(())
    }

    pub fn upsert_node(&self, node: &Node) -> Result<()> {
        self.tx.execute(
            "INSERT OR REPLACE INTO nodes
             (id, parent_id, name, kind, line_start, line_end, signature, docstring,
              base_classes, base_refs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                node.id,
                node.parent_id,
                node.name,
                node.kind.as_str(),
                node.line_start as i64,
                node.line_end as i64,
                node.signature,
                node.docstring,
                serde_json::to_string(&node.base_classes)?,
                serde_json::to_string(&node.base_refs)?,
            ],
        )?;
        Ok(())
    }

    /// Searchable node ids owned by a file; their documents must be removed
    /// before the nodes are.
    pub fn searchable_ids_for_file(&self, path: &str) -> Result<Vec<String>> {
        let pattern = format!("{}:%", escape_like(path));
        let mut stmt = self.tx.prepare(
            "SELECT id FROM nodes
             WHERE (id = ?1 OR id LIKE ?2 ESCAPE '\\')
               AND kind IN ('class','interface','enum','struct','trait','function','method')
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![path, pattern], |row| row.get(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn delete_nodes_for_file(&self, path: &str) -> Result<usize> {
        let pattern = format!("{}:%", escape_like(path));
        let deleted = self.tx.execute(
            "DELETE FROM nodes WHERE id = ?1 OR id LIKE ?2 ESCAPE '\\'",
            params![path, pattern],
        )?;
        Ok(deleted)
    }

    pub fn delete_edges_for_file(&self, path: &str) -> Result<usize> {
        let pattern = format!("{}:%", escape_like(path));
        let deleted = self.tx.execute(
            "DELETE FROM edges WHERE source_id = ?1 OR source_id LIKE ?2 ESCAPE '\\'",
            params![path, pattern],
        )?;
        Ok(deleted)
    }

    /// Resolved edges whose target vanished degrade to unresolved, keeping
    /// the raw name for a later re-attempt. Never a crash, never a stale id.
    pub fn degrade_dangling_edges(&self) -> Result<usize> {
        let changed = self.tx.execute(
            "UPDATE edges SET status = 'unresolved', target_id = NULL, candidates = NULL
             WHERE status = 'resolved'
               AND target_id NOT IN (SELECT id FROM nodes)",
            [],
        )?;
        Ok(changed)
    }

    /// Drop directory nodes that lost all children, bottom-up. The root
    /// stays: an empty project is still a valid graph.
    pub fn prune_empty_directories(&self) -> Result<()> {
        loop {
            let deleted = self.tx.execute(
                "DELETE FROM nodes
                 WHERE kind = 'directory' AND id != '.'
                   AND id NOT IN (SELECT parent_id FROM nodes WHERE parent_id IS NOT NULL)",
                [],
            )?;
            if deleted == 0 {
                return Ok(());
            }
        }
    }

    pub fn insert_edge(&self, edge: &Edge) -> Result<()> {
        let candidates = if edge.candidates.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&edge.candidates)?)
        };
        self.tx.execute(
            "INSERT INTO edges (source_id, kind, status, target_id, raw_name, candidates,
                                receiver, line)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                edge.source_id,
                edge.kind.as_str(),
                edge.status.as_str(),
                edge.target_id,
                edge.raw_name,
                candidates,
                edge.receiver,
                edge.line.map(|l| l as i64),
            ],
        )?;
        Ok(())
    }

    /// Edges still worth a resolution attempt, with their row ids.
    pub fn edges_pending_resolution(&self) -> Result<Vec<(i64, Edge)>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, source_id, kind, status, target_id, raw_name, candidates, receiver, line
             FROM edges WHERE status != 'resolved' ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let id: i64 = row.get(0)?;
            Ok((id, edge_from_offset_row(row, 1)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn set_edge_resolution(
        &self,
        edge_row: i64,
        status: EdgeStatus,
        target_id: Option<&str>,
        candidates: &[String],
    ) -> Result<()> {
        let candidates = if candidates.is_empty() {
            None
        } else {
            Some(serde_json::to_string(candidates)?)
        };
        self.tx.execute(
            "UPDATE edges SET status = ?2, target_id = ?3, candidates = ?4 WHERE id = ?1",
            params![edge_row, status.as_str(), target_id, candidates],
        )?;
        Ok(())
    }

    pub fn set_base_refs(&self, node_id: &str, refs: &[String]) -> Result<()> {
        self.tx.execute(
            "UPDATE nodes SET base_refs = ?2 WHERE id = ?1",
            params![node_id, serde_json::to_string(refs)?],
        )?;
        Ok(())
    }

    /// Class-like nodes that declare bases, for base re-resolution.
    pub fn nodes_with_base_classes(&self) -> Result<Vec<Node>> {
        query_nodes(
            &self.tx,
            "SELECT * FROM nodes
             WHERE kind IN ('class','interface','enum','struct','trait')
               AND base_classes != '[]'
             ORDER BY id",
            params![],
        )
    }

    pub fn node_exists(&self, id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .tx
            .query_row("SELECT 1 FROM nodes WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    pub fn symbol_entries(&self) -> Result<Vec<SymbolEntry>> {
        symbol_entries(&self.tx)
    }

    pub fn upsert_fingerprint(&self, fingerprint: &FileFingerprint) -> Result<()> {
        self.tx.execute(
            "INSERT OR REPLACE INTO files (path, hash, mtime, indexed_at)
             VALUES (?1, ?2, ?3, datetime('now'))",
            params![fingerprint.path, fingerprint.hash, fingerprint.mtime],
        )?;
        Ok(())
    }

    pub fn delete_fingerprint(&self, path: &str) -> Result<()> {
        self.tx
            .execute("DELETE FROM files WHERE path = ?1", params![path])?;
        Ok(())
    }

    // -- search statistics (delta-maintained, never rebuilt) ----------------

    /// Remove one document: decrement df for every term it contained, drop
    /// its term-frequency rows, decrement the document count.
    pub fn remove_search_document(&self, node_id: &str) -> Result<()> {
        self.tx.execute(
            "UPDATE term_stats SET df = df - 1
             WHERE term IN (SELECT term FROM search_terms WHERE node_id = ?1)",
            params![node_id],
        )?;
        self.tx
            .execute("DELETE FROM term_stats WHERE df <= 0", [])?;
        self.tx.execute(
            "DELETE FROM search_terms WHERE node_id = ?1",
            params![node_id],
        )?;
        let count = meta_i64(&self.tx, schema::META_DOC_COUNT)?;
        self.set_meta_i64(schema::META_DOC_COUNT, (count - 1).max(0))?;
        Ok(())
    }

    /// Add one document from its term-frequency vector. An empty vector is
    /// fine: the document counts, it just matches nothing.
    pub fn add_search_document(&self, node_id: &str, counts: &BTreeMap<String, i64>) -> Result<()> {
        for (term, tf) in counts {
            self.tx.execute(
                "INSERT OR REPLACE INTO search_terms (node_id, term, tf) VALUES (?1, ?2, ?3)",
                params![node_id, term, tf],
            )?;
            self.tx.execute(
                "INSERT INTO term_stats (term, df) VALUES (?1, 1)
                 ON CONFLICT(term) DO UPDATE SET df = df + 1",
                params![term],
            )?;
        }
        let count = meta_i64(&self.tx, schema::META_DOC_COUNT)?;
        self.set_meta_i64(schema::META_DOC_COUNT, count + 1)?;
        Ok(())
    }

    /// `(resolved, ambiguous, unresolved)` edge counts for the run report.
    pub fn edge_status_counts(&self) -> Result<(usize, usize, usize)> {
        let mut stmt = self
            .tx
            .prepare("SELECT status, COUNT(*) FROM edges GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let (mut resolved, mut ambiguous, mut unresolved) = (0usize, 0usize, 0usize);
        for row in rows {
            let (status, count) = row?;
            match EdgeStatus::parse(&status) {
                Some(EdgeStatus::Resolved) => resolved = count as usize,
                Some(EdgeStatus::Ambiguous) => ambiguous = count as usize,
                Some(EdgeStatus::Unresolved) => unresolved = count as usize,
                None => {}
            }
        }
        Ok((resolved, ambiguous, unresolved))
    }

    pub fn bump_epoch(&self) -> Result<i64> {
        let next = meta_i64(&self.tx, schema::META_EPOCH)? + 1;
        self.set_meta_i64(schema::META_EPOCH, next)?;
        Ok(next)
    }

    fn set_meta_i64(&self, key: &str, value: i64) -> Result<()> {
        self.tx.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value.to_string()],
        )?;
        Ok(())
    }
}

// -- row mapping helpers ----------------------------------------------------

fn get_node(conn: &Connection, id: &str) -> Result<Option<Node>> {
    let mut nodes = query_nodes(conn, "SELECT * FROM nodes WHERE id = ?1", params![id])?;
    Ok(nodes.pop())
}

fn query_nodes<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Node>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, node_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn node_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Node> {
    let kind_text: String = row.get("kind")?;
    let base_classes: String = row.get("base_classes")?;
    let base_refs: String = row.get("base_refs")?;
    Ok(Node {
        id: row.get("id")?,
        parent_id: row.get("parent_id")?,
        name: row.get("name")?,
        kind: NodeKind::parse(&kind_text).unwrap_or(NodeKind::File),
        line_start: row.get::<_, i64>("line_start")? as usize,
        line_end: row.get::<_, i64>("line_end")? as usize,
        signature: row.get("signature")?,
        docstring: row.get("docstring")?,
        base_classes: serde_json::from_str(&base_classes).unwrap_or_default(),
        base_refs: serde_json::from_str(&base_refs).unwrap_or_default(),
    })
}

fn query_edges<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Edge>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| edge_from_offset_row(row, 0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Read an edge starting at column `offset` (the pending-resolution query
/// prefixes the row id).
fn edge_from_offset_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Edge> {
    let kind_text: String = row.get(offset + 1)?;
    let status_text: String = row.get(offset + 2)?;
    let candidates: Option<String> = row.get(offset + 5)?;
    Ok(Edge {
        source_id: row.get(offset)?,
        kind: EdgeKind::parse(&kind_text).unwrap_or(EdgeKind::Calls),
        status: EdgeStatus::parse(&status_text).unwrap_or(EdgeStatus::Unresolved),
        target_id: row.get(offset + 3)?,
        raw_name: row.get(offset + 4)?,
        candidates: candidates
            .map(|text| serde_json::from_str(&text).unwrap_or_default())
            .unwrap_or_default(),
        receiver: row.get(offset + 6)?,
        line: row.get::<_, Option<i64>>(offset + 7)?.map(|l| l as usize),
    })
}

fn subtree_stats(conn: &Connection, id: &str) -> Result<SubtreeStats> {
    let mut stmt = conn.prepare(
        "WITH RECURSIVE descendants AS (
             SELECT id, kind FROM nodes WHERE id = ?1
             UNION ALL
             SELECT n.id, n.kind FROM nodes n
             INNER JOIN descendants d ON n.parent_id = d.id
         )
         SELECT kind, COUNT(*) FROM descendants GROUP BY kind",
    )?;
    let rows = stmt.query_map(params![id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut stats = SubtreeStats::default();
    for row in rows {
        let (kind, count) = row?;
        match NodeKind::parse(&kind) {
            Some(NodeKind::File) => stats.files += count,
            Some(k) if k.is_class_like() => stats.classes += count,
            Some(NodeKind::Function) => stats.functions += count,
            Some(NodeKind::Method) => stats.methods += count,
            _ => {}
        }
    }
    Ok(stats)
}

fn symbol_entries(conn: &Connection) -> Result<Vec<SymbolEntry>> {
    let mut stmt = conn.prepare(
        "SELECT n.id, n.name, n.kind, p.name, p.kind
         FROM nodes n LEFT JOIN nodes p ON n.parent_id = p.id
         WHERE n.kind IN ('class','interface','enum','struct','trait','function','method')
         ORDER BY n.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, name, kind_text, parent_name, parent_kind) = row?;
        let Some(kind) = NodeKind::parse(&kind_text) else {
            continue;
        };
        let enclosing_class = match (parent_name, parent_kind.and_then(|k| NodeKind::parse(&k))) {
            (Some(name), Some(kind)) if kind.is_class_like() => Some(name),
            _ => None,
        };
        let file_path = crate::core::graph::owning_file(&id).to_string();
        out.push(SymbolEntry {
            id,
            name,
            kind,
            file_path,
            enclosing_class,
        });
    }
    Ok(out)
}

fn meta_i64(conn: &Connection, key: &str) -> Result<i64> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
}

/// Escape LIKE wildcards in a literal path prefix (`_` is common in file
/// names and must not match arbitrary characters).
fn escape_like(path: &str) -> String {
    path.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
