//! Name resolution against the project-wide symbol table.
//!
//! Resolution is purely declarative: the declared name either matches or it
//! does not. No type inference, no transitive override chasing. When more
//! than one definition matches at the deciding scope the edge is recorded
//! as ambiguous with every candidate — never a silent pick.

use std::collections::HashMap;

use crate::core::graph::owning_file;
use crate::store::SymbolEntry;

/// Outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Ambiguous(Vec<String>),
    Unresolved,
}

pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    by_name: HashMap<String, Vec<usize>>,
    by_id: HashMap<String, usize>,
}

impl SymbolTable {
    /// Entries must arrive in deterministic (id) order so candidate lists
    /// are stable across runs.
    pub fn build(entries: Vec<SymbolEntry>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::with_capacity(entries.len());
        let mut by_id: HashMap<String, usize> = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            by_name.entry(entry.name.clone()).or_default().push(idx);
            by_id.insert(entry.id.clone(), idx);
        }
        Self {
            entries,
            by_name,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn candidates<'s>(&'s self, name: &str) -> impl Iterator<Item = &'s SymbolEntry> + 's {
        self.by_name
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|idx| &self.entries[*idx])
    }

    fn entry(&self, id: &str) -> Option<&SymbolEntry> {
        self.by_id.get(id).map(|idx| &self.entries[*idx])
    }
}

pub struct Resolver<'a> {
    table: &'a SymbolTable,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        Self { table }
    }

    /// Resolve a call site. Priority: enclosing-class method behind a
    /// self-style receiver, then a unique same-file definition, then a
    /// unique project-wide one.
    pub fn resolve_call(&self, caller_id: &str, callee: &str, self_receiver: bool) -> Resolution {
        let name = trailing_name(callee);
        let caller_file = owning_file(caller_id);

        if self_receiver {
            // The caller's own enclosing class; for a call written inside a
            // method, that method's parent class.
            let caller_class = self
                .table
                .entry(caller_id)
                .and_then(|entry| entry.enclosing_class.as_deref());
            if let Some(class) = caller_class {
                let own: Vec<&SymbolEntry> = self
                    .table
                    .candidates(name)
                    .filter(|c| {
                        c.file_path == caller_file && c.enclosing_class.as_deref() == Some(class)
                    })
                    .collect();
                if let [single] = own.as_slice() {
                    return Resolution::Resolved(single.id.clone());
                }
            }
        }

        let callable: Vec<&SymbolEntry> = self
            .table
            .candidates(name)
            .filter(|c| c.kind.is_callable())
            .collect();

        scoped_resolution(&callable, caller_file)
    }

    /// Resolve a declared base-class name, only against class-like nodes.
    /// Unresolved bases are external symbols, not failures.
    pub fn resolve_base(&self, subclass_id: &str, base: &str) -> Resolution {
        let name = trailing_name(base);
        let from_file = owning_file(subclass_id);

        let class_like: Vec<&SymbolEntry> = self
            .table
            .candidates(name)
            .filter(|c| c.kind.is_class_like())
            .collect();

        scoped_resolution(&class_like, from_file)
    }
}

/// Shared scoping tail: unique same-file match wins, several same-file
/// matches are ambiguous; otherwise a unique project-wide match wins,
/// several are ambiguous, none is unresolved.
fn scoped_resolution(candidates: &[&SymbolEntry], from_file: &str) -> Resolution {
    let same_file: Vec<&&SymbolEntry> = candidates
        .iter()
        .filter(|c| c.file_path == from_file)
        .collect();
    match same_file.as_slice() {
        [single] => return Resolution::Resolved(single.id.clone()),
        [] => {}
        many => {
            return Resolution::Ambiguous(many.iter().map(|c| c.id.clone()).collect());
        }
    }

    match candidates {
        [] => Resolution::Unresolved,
        [single] => Resolution::Resolved(single.id.clone()),
        many => Resolution::Ambiguous(many.iter().map(|c| c.id.clone()).collect()),
    }
}

/// `module.Base` / `ns::Base` style references match on their trailing
/// segment; the qualifier is an import-path detail the graph does not model.
fn trailing_name(raw: &str) -> &str {
    let after_dot = raw.rsplit('.').next().unwrap_or(raw);
    after_dot.rsplit("::").next().unwrap_or(after_dot)
}
