pub mod calls;
pub mod common;
pub mod go;
pub mod java;
pub mod javascript;
pub mod python;
pub mod rust;
pub mod typescript;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::graph::NodeKind;
use crate::errors::Result;

/// An entity found in a single file, before any id is assigned. Nesting is
/// expressed by `scope`: the name chain of enclosing entities, outermost
/// first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDraft {
    pub name: String,
    pub kind: NodeKind,
    pub scope: Vec<String>,
    pub line_start: usize,
    pub line_end: usize,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub base_classes: Vec<String>,
}

impl EntityDraft {
    pub fn new(name: String, kind: NodeKind, scope: Vec<String>, start: usize, end: usize) -> Self {
        Self {
            name,
            kind,
            scope,
            line_start: start,
            line_end: end,
            signature: None,
            docstring: None,
            base_classes: Vec::new(),
        }
    }
}

/// Receiver marker on a call site, used by the resolver's same-class rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    None,
    /// `self.`, `this.`, `cls.` style receivers.
    SelfLike,
    Named(String),
}

/// A raw, unresolved call fact: the literal callee text plus the scope
/// chain of the calling entity (empty when the call is at module level).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCall {
    pub caller_scope: Vec<String>,
    pub callee: String,
    pub receiver: Receiver,
    pub line: usize,
}

/// Everything one extractor run produces for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub entities: Vec<EntityDraft>,
    pub calls: Vec<RawCall>,
    /// Non-fatal oddities worth surfacing in the run report.
    pub warnings: Vec<String>,
}

/// One per supported language. Extractors must be deterministic: identical
/// content always yields identical drafts and call facts.
pub trait Extractor: Send + Sync {
    fn language(&self) -> &'static str;
    fn extensions(&self) -> &'static [&'static str];
    /// Turn file text into entity drafts and raw call facts. Malformed
    /// input is a recoverable `Error::Extraction`; the indexer skips the
    /// file and keeps going.
    fn extract(&self, path: &Path, content: &str) -> Result<Extraction>;
}

/// Maps file extensions to extractors. Owns nothing beyond the mapping;
/// new languages register here and touch nothing else.
#[derive(Clone)]
pub struct ExtractorRegistry {
    by_extension: HashMap<&'static str, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Registry with every built-in language.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(python::PythonExtractor::new()));
        registry.register(Arc::new(rust::RustExtractor::new()));
        registry.register(Arc::new(javascript::JavaScriptExtractor::new()));
        registry.register(Arc::new(typescript::TypeScriptExtractor::new()));
        registry.register(Arc::new(go::GoExtractor::new()));
        registry.register(Arc::new(java::JavaExtractor::new()));
        registry
    }

    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        for ext in extractor.extensions() {
            self.by_extension.insert(*ext, Arc::clone(&extractor));
        }
    }

    pub fn for_extension(&self, extension: &str) -> Option<&Arc<dyn Extractor>> {
        self.by_extension.get(extension)
    }

    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self.by_extension.keys().copied().collect();
        exts.sort_unstable();
        exts
    }
}
