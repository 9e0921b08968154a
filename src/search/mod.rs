//! TF-IDF keyword search over the committed graph.
//!
//! Scores come straight from the persisted term statistics, which the
//! indexer maintains as deltas inside each write transaction. The results
//! cache is invalidated wholesale whenever the store epoch moves —
//! correctness over partial-cache cleverness.

pub mod tokenizer;

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::core::graph::NodeKind;
use crate::errors::Result;
use crate::store::GraphStore;

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub score: f64,
    pub signature: Option<String>,
}

pub struct SearchEngine {
    cache: DashMap<(String, usize), Arc<Vec<SearchHit>>>,
    cached_epoch: AtomicI64,
}

impl SearchEngine {
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
            cached_epoch: AtomicI64::new(-1),
        }
    }

    /// Ranked keyword query. Ties break on node id so ordering is
    /// deterministic; an empty token set scores nothing and returns empty.
    pub fn search(&self, store: &GraphStore, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let epoch = store.epoch()?;
        if self.cached_epoch.swap(epoch, Ordering::SeqCst) != epoch {
            self.cache.clear();
        }

        let terms = tokenizer::query_terms(query);
        if terms.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let key = (terms.join(" "), limit);
        if let Some(cached) = self.cache.get(&key) {
            return Ok((**cached).clone());
        }

        let total_docs = store.doc_count()?;
        let mut scores: HashMap<String, f64> = HashMap::new();

        for term in &terms {
            let df = store.term_df(term)?;
            if df == 0 {
                continue;
            }
            // The +1 terms keep idf finite for universal terms and defined
            // when the index is empty.
            let idf = ((total_docs as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0;
            for (node_id, tf) in store.term_postings(term)? {
                *scores.entry(node_id).or_insert(0.0) += tf as f64 * idf;
            }
        }

        let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(limit);

        let mut hits = Vec::with_capacity(ranked.len());
        for (node_id, score) in ranked {
            if let Some(node) = store.node(&node_id)? {
                hits.push(SearchHit {
                    id: node.id,
                    name: node.name,
                    kind: node.kind,
                    score,
                    signature: node.signature,
                });
            }
        }

        let hits = Arc::new(hits);
        self.cache.insert(key, Arc::clone(&hits));
        Ok((*hits).clone())
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}
