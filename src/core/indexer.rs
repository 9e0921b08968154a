//! Index orchestration: full and incremental runs.
//!
//! Extraction is file-parallel and share-nothing; everything that mutates
//! the graph happens inside one write transaction, so a run either commits
//! whole or leaves the previous graph untouched.

use rayon::prelude::*;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

use crate::core::graph::{
    entity_id, Edge, EdgeKind, EdgeStatus, FileFingerprint, Node, NodeKind, ROOT_ID,
};
use crate::core::resolver::{Resolution, Resolver, SymbolTable};
use crate::core::scanner::{FileScanner, SourceFile};
use crate::errors::Result;
use crate::extractors::{Extraction, ExtractorRegistry, Receiver};
use crate::search::tokenizer;
use crate::store::{GraphStore, WriteTxn};

/// Summary of one index run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexReport {
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_removed: usize,
    pub files_skipped: usize,
    pub entities: usize,
    pub edges_resolved: usize,
    pub edges_ambiguous: usize,
    pub edges_unresolved: usize,
    pub warnings: Vec<String>,
    pub elapsed_ms: u64,
}

/// One file's worth of extraction output, ready to write.
struct FileBatch {
    rel_path: String,
    fingerprint: FileFingerprint,
    line_count: usize,
    extraction: Extraction,
}

/// A file read off disk, hashed but not yet extracted.
struct ReadFile {
    file: SourceFile,
    content: String,
    fingerprint: FileFingerprint,
}

pub struct Indexer {
    root: PathBuf,
    registry: ExtractorRegistry,
    scanner: FileScanner,
}

impl Indexer {
    pub fn new(root: impl Into<PathBuf>, registry: ExtractorRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            scanner: FileScanner::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run an index pass. `incremental` falls back to a full run when no
    /// fingerprints exist yet.
    pub fn run(&self, store: &GraphStore, incremental: bool) -> Result<IndexReport> {
        let started = Instant::now();
        let mut report = IndexReport::default();

        let files = self.scanner.scan(&self.root, &self.registry)?;
        report.files_seen = files.len();
        debug!(files = files.len(), "scan complete");

        // Presence is judged from the scan itself, so a file that exists
        // but fails to read is skipped, not mistaken for a deletion.
        let current_paths: HashSet<String> =
            files.iter().map(|f| f.rel_path.clone()).collect();

        let stored: HashMap<String, FileFingerprint> = store
            .fingerprints()?
            .into_iter()
            .map(|fp| (fp.path.clone(), fp))
            .collect();
        let incremental = incremental && !stored.is_empty();

        // Hash every candidate in parallel; unreadable or undecodable files
        // are skipped with a warning, never a crash.
        let read_results: Vec<std::result::Result<ReadFile, String>> = files
            .into_par_iter()
            .map(|file| read_and_hash(file))
            .collect();

        let mut readable: Vec<ReadFile> = Vec::new();
        for result in read_results {
            match result {
                Ok(read) => readable.push(read),
                Err(warning) => {
                    warn!("{warning}");
                    report.warnings.push(warning);
                    report.files_skipped += 1;
                }
            }
        }

        // Unchanged hash: skip entirely. No re-extraction, no graph touch.
        let (to_extract, unchanged): (Vec<ReadFile>, Vec<ReadFile>) =
            readable.into_iter().partition(|read| {
                !incremental
                    || stored
                        .get(&read.file.rel_path)
                        .map(|fp| fp.hash != read.fingerprint.hash)
                        .unwrap_or(true)
            });
        report.files_unchanged = unchanged.len();

        let removed: Vec<String> = if incremental {
            let mut removed: Vec<String> = stored
                .keys()
                .filter(|path| !current_paths.contains(*path))
                .cloned()
                .collect();
            removed.sort();
            removed
        } else {
            Vec::new()
        };
        report.files_removed = removed.len();

        // Extraction fan-out: per-file, share-nothing.
        let extraction_results: Vec<std::result::Result<FileBatch, String>> = to_extract
            .into_par_iter()
            .map(|read| self.extract_one(read))
            .collect();

        let mut batches: Vec<FileBatch> = Vec::new();
        for result in extraction_results {
            match result {
                Ok(batch) => {
                    report.warnings.extend(batch.extraction.warnings.clone());
                    batches.push(batch);
                }
                Err(warning) => {
                    // A failed re-extraction keeps the file's previous
                    // committed state; a failed new file contributes nothing.
                    warn!("{warning}");
                    report.warnings.push(warning);
                    report.files_skipped += 1;
                }
            }
        }
        report.files_indexed = batches.len();
        batches.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));

        let root_name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ROOT_ID.to_string());

        store.write(|tx| {
            if !incremental {
                tx.clear_graph()?;
            } else {
                for path in &removed {
                    purge_file(tx, path)?;
                    tx.delete_fingerprint(path)?;
                }
                for batch in &batches {
                    if stored.contains_key(&batch.rel_path) {
                        purge_file(tx, &batch.rel_path)?;
                    }
                }
            }

            write_structure(tx, &root_name, &batches, &mut report)?;

            if incremental {
                tx.prune_empty_directories()?;
            }

            // Resolution runs against the symbol table of the whole
            // post-diff graph: surviving nodes plus fresh extractions.
            let table = SymbolTable::build(tx.symbol_entries()?);
            let resolver = Resolver::new(&table);

            for batch in &batches {
                write_relationships(tx, &resolver, batch)?;
            }

            if incremental {
                tx.degrade_dangling_edges()?;
                reresolve_pending_edges(tx, &resolver)?;
                reresolve_partial_bases(tx, &resolver)?;
            }

            for batch in &batches {
                write_search_documents(tx, batch)?;
                tx.upsert_fingerprint(&batch.fingerprint)?;
            }

            let (resolved, ambiguous, unresolved) = tx.edge_status_counts()?;
            report.edges_resolved = resolved;
            report.edges_ambiguous = ambiguous;
            report.edges_unresolved = unresolved;

            tx.bump_epoch()?;
            Ok(())
        })?;

        report.elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            indexed = report.files_indexed,
            unchanged = report.files_unchanged,
            removed = report.files_removed,
            "index run committed"
        );
        Ok(report)
    }

    fn extract_one(&self, read: ReadFile) -> std::result::Result<FileBatch, String> {
        let Some(extractor) = self.registry.for_extension(&read.file.extension) else {
            return Err(format!("{}: no extractor registered", read.file.rel_path));
        };
        match extractor.extract(&read.file.abs_path, &read.content) {
            Ok(extraction) => Ok(FileBatch {
                rel_path: read.file.rel_path,
                fingerprint: read.fingerprint,
                line_count: read.content.lines().count().max(1),
                extraction,
            }),
            Err(err) => Err(format!("{}: {err}", read.file.rel_path)),
        }
    }
}

fn read_and_hash(file: SourceFile) -> std::result::Result<ReadFile, String> {
    let bytes = std::fs::read(&file.abs_path)
        .map_err(|err| format!("{}: unreadable: {err}", file.rel_path))?;
    let hash = format!("{:x}", Sha256::digest(&bytes));
    let mtime = std::fs::metadata(&file.abs_path)
        .ok()
        .and_then(|meta| meta.modified().ok())
        .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0);
    let content = String::from_utf8(bytes)
        .map_err(|_| format!("{}: undecodable (not UTF-8)", file.rel_path))?;
    let fingerprint = FileFingerprint {
        path: file.rel_path.clone(),
        hash,
        mtime,
    };
    Ok(ReadFile {
        file,
        content,
        fingerprint,
    })
}

/// Remove everything a file owns: its search documents first (they need the
/// node rows), then its edges, then its nodes.
fn purge_file(tx: &WriteTxn<'_>, path: &str) -> Result<()> {
    for id in tx.searchable_ids_for_file(path)? {
        tx.remove_search_document(&id)?;
    }
    tx.delete_edges_for_file(path)?;
    tx.delete_nodes_for_file(path)?;
    Ok(())
}

/// Insert directory, file, and entity nodes for every batch.
fn write_structure(
    tx: &WriteTxn<'_>,
    root_name: &str,
    batches: &[FileBatch],
    report: &mut IndexReport,
) -> Result<()> {
    let root = Node::new(ROOT_ID.to_string(), None, root_name.to_string(), NodeKind::Directory);
    tx.upsert_node(&root)?;

    let mut directories: BTreeSet<String> = BTreeSet::new();
    for batch in batches {
        let mut prefix = String::new();
        let mut components: Vec<&str> = batch.rel_path.split('/').collect();
        components.pop(); // file name
        for component in components {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(component);
            directories.insert(prefix.clone());
        }
    }
    for dir in &directories {
        let (parent, name) = match dir.rsplit_once('/') {
            Some((parent, name)) => (parent.to_string(), name.to_string()),
            None => (ROOT_ID.to_string(), dir.clone()),
        };
        let node = Node::new(dir.clone(), Some(parent), name, NodeKind::Directory);
        tx.upsert_node(&node)?;
    }

    for batch in batches {
        let rel = &batch.rel_path;
        let parent_dir = match rel.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => ROOT_ID.to_string(),
        };
        let file_name = rel.rsplit('/').next().unwrap_or(rel).to_string();
        let file_node = Node::new(rel.clone(), Some(parent_dir), file_name, NodeKind::File)
            .with_lines(1, batch.line_count);
        tx.upsert_node(&file_node)?;

        for node in entity_nodes(batch).values() {
            tx.upsert_node(node)?;
            report.entities += 1;
        }
    }
    Ok(())
}

/// Build the entity nodes of one batch keyed by id. Duplicate definitions
/// of the same id collapse to the last one, matching source order.
fn entity_nodes(batch: &FileBatch) -> BTreeMap<String, Node> {
    let rel = &batch.rel_path;
    let ids: HashSet<String> = batch
        .extraction
        .entities
        .iter()
        .map(|d| entity_id(rel, &d.scope, &d.name))
        .collect();

    let mut nodes: BTreeMap<String, Node> = BTreeMap::new();
    for draft in &batch.extraction.entities {
        let id = entity_id(rel, &draft.scope, &draft.name);
        let parent_id = match draft.scope.split_last() {
            Some((name, prefix)) => {
                let candidate = entity_id(rel, prefix, name);
                if ids.contains(&candidate) {
                    candidate
                } else {
                    rel.clone()
                }
            }
            None => rel.clone(),
        };

        let mut node = Node::new(id.clone(), Some(parent_id), draft.name.clone(), draft.kind)
            .with_lines(draft.line_start, draft.line_end)
            .with_base_classes(draft.base_classes.clone());
        node.signature = draft.signature.clone();
        node.docstring = draft.docstring.clone();
        nodes.insert(id, node);
    }
    nodes
}

/// Resolve and write this batch's call edges, base refs, and inherits edges.
fn write_relationships(tx: &WriteTxn<'_>, resolver: &Resolver<'_>, batch: &FileBatch) -> Result<()> {
    let rel = &batch.rel_path;
    let nodes = entity_nodes(batch);
    let known: HashSet<String> = nodes.keys().cloned().collect();

    for call in &batch.extraction.calls {
        let caller_id = caller_node_id(rel, &call.caller_scope, &known);
        let (receiver, self_like) = match &call.receiver {
            Receiver::None => (None, false),
            Receiver::SelfLike => (Some("self".to_string()), true),
            Receiver::Named(name) => (Some(name.clone()), false),
        };
        let resolution = resolver.resolve_call(&caller_id, &call.callee, self_like);
        let (status, target_id, candidates) = resolution_parts(resolution);
        tx.insert_edge(&Edge {
            source_id: caller_id,
            kind: EdgeKind::Calls,
            status,
            target_id,
            raw_name: call.callee.clone(),
            candidates,
            receiver,
            line: Some(call.line),
        })?;
    }

    for node in nodes.values() {
        if node.base_classes.is_empty() {
            continue;
        }
        let mut refs: Vec<String> = Vec::new();
        for base in &node.base_classes {
            let resolution = resolver.resolve_base(&node.id, base);
            if let Resolution::Resolved(id) = &resolution {
                if !refs.contains(id) {
                    refs.push(id.clone());
                }
            }
            let (status, target_id, candidates) = resolution_parts(resolution);
            tx.insert_edge(&Edge {
                source_id: node.id.clone(),
                kind: EdgeKind::Inherits,
                status,
                target_id,
                raw_name: base.clone(),
                candidates,
                receiver: None,
                line: Some(node.line_start),
            })?;
        }
        tx.set_base_refs(&node.id, &refs)?;
    }
    Ok(())
}

/// Attribute a call to the nearest extracted ancestor scope; module-level
/// calls belong to the file node, which always exists.
fn caller_node_id(rel: &str, scope: &[String], known: &HashSet<String>) -> String {
    for len in (1..=scope.len()).rev() {
        let id = entity_id(rel, &scope[..len - 1], &scope[len - 1]);
        if known.contains(&id) {
            return id;
        }
    }
    rel.to_string()
}

fn resolution_parts(resolution: Resolution) -> (EdgeStatus, Option<String>, Vec<String>) {
    match resolution {
        Resolution::Resolved(id) => (EdgeStatus::Resolved, Some(id), Vec::new()),
        Resolution::Ambiguous(candidates) => (EdgeStatus::Ambiguous, None, candidates),
        Resolution::Unresolved => (EdgeStatus::Unresolved, None, Vec::new()),
    }
}

/// Re-attempt every stored edge that is not cleanly resolved. A newly added
/// file may resolve a name that was external before; a deletion may have
/// degraded a previously resolved edge.
fn reresolve_pending_edges(tx: &WriteTxn<'_>, resolver: &Resolver<'_>) -> Result<()> {
    for (row, edge) in tx.edges_pending_resolution()? {
        let self_like = edge.receiver.as_deref() == Some("self");
        let resolution = match edge.kind {
            EdgeKind::Calls => resolver.resolve_call(&edge.source_id, &edge.raw_name, self_like),
            EdgeKind::Inherits => resolver.resolve_base(&edge.source_id, &edge.raw_name),
        };
        let (status, target_id, candidates) = resolution_parts(resolution);
        tx.set_edge_resolution(row, status, target_id.as_deref(), &candidates)?;
    }
    Ok(())
}

/// Recompute base refs for class-like nodes whose refs are incomplete or
/// point at deleted nodes.
fn reresolve_partial_bases(tx: &WriteTxn<'_>, resolver: &Resolver<'_>) -> Result<()> {
    for node in tx.nodes_with_base_classes()? {
        let mut stale = node.base_refs.len() < node.base_classes.len();
        if !stale {
            for id in &node.base_refs {
                if !tx.node_exists(id)? {
                    stale = true;
                    break;
                }
            }
        }
        if !stale {
            continue;
        }
        let mut refs: Vec<String> = Vec::new();
        for base in &node.base_classes {
            if let Resolution::Resolved(id) = resolver.resolve_base(&node.id, base) {
                if !refs.contains(&id) {
                    refs.push(id);
                }
            }
        }
        tx.set_base_refs(&node.id, &refs)?;
    }
    Ok(())
}

/// Tokenize and add this batch's searchable nodes as documents.
fn write_search_documents(tx: &WriteTxn<'_>, batch: &FileBatch) -> Result<()> {
    for node in entity_nodes(batch).values() {
        if !node.kind.is_searchable() {
            continue;
        }
        let counts = tokenizer::document_terms(
            &node.name,
            node.signature.as_deref(),
            node.docstring.as_deref(),
        );
        tx.add_search_document(&node.id, &counts)?;
    }
    Ok(())
}
