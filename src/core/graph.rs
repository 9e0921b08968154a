use petgraph::{graph::NodeIndex, Directed, Graph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{Error, Result};

/// Id of the project root directory node.
pub const ROOT_ID: &str = ".";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Directory,
    File,
    Class,
    Interface,
    Enum,
    Struct,
    Trait,
    Function,
    Method,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Enum => "enum",
            NodeKind::Struct => "struct",
            NodeKind::Trait => "trait",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
        }
    }

    pub fn parse(s: &str) -> Option<NodeKind> {
        match s {
            "directory" => Some(NodeKind::Directory),
            "file" => Some(NodeKind::File),
            "class" => Some(NodeKind::Class),
            "interface" => Some(NodeKind::Interface),
            "enum" => Some(NodeKind::Enum),
            "struct" => Some(NodeKind::Struct),
            "trait" => Some(NodeKind::Trait),
            "function" => Some(NodeKind::Function),
            "method" => Some(NodeKind::Method),
            _ => None,
        }
    }

    /// Class, interface, enum, struct, trait. The only kinds a base-class
    /// name may resolve against.
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Enum
                | NodeKind::Struct
                | NodeKind::Trait
        )
    }

    /// Kinds a call site may resolve to: functions, methods, and class-like
    /// nodes (constructor-style calls).
    pub fn is_callable(self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method) || self.is_class_like()
    }

    /// Kinds that become search documents.
    pub fn is_searchable(self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method) || self.is_class_like()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Contains parent. `None` only for the project root.
    pub parent_id: Option<String>,
    pub name: String,
    pub kind: NodeKind,
    pub line_start: usize,
    pub line_end: usize,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    /// Declared base names in source order, pre-resolution.
    pub base_classes: Vec<String>,
    /// Resolved base node ids. May stay partially empty when a base is
    /// external to the project.
    pub base_refs: Vec<String>,
}

impl Node {
    pub fn new(id: String, parent_id: Option<String>, name: String, kind: NodeKind) -> Self {
        Self {
            id,
            parent_id,
            name,
            kind,
            line_start: 0,
            line_end: 0,
            signature: None,
            docstring: None,
            base_classes: Vec::new(),
            base_refs: Vec::new(),
        }
    }

    pub fn with_lines(mut self, start: usize, end: usize) -> Self {
        self.line_start = start;
        self.line_end = end;
        self
    }

    pub fn with_signature(mut self, signature: String) -> Self {
        self.signature = Some(signature);
        self
    }

    pub fn with_docstring(mut self, docstring: String) -> Self {
        self.docstring = Some(docstring);
        self
    }

    pub fn with_base_classes(mut self, bases: Vec<String>) -> Self {
        self.base_classes = bases;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Calls,
    Inherits,
}

impl EdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeKind::Calls => "calls",
            EdgeKind::Inherits => "inherits",
        }
    }

    pub fn parse(s: &str) -> Option<EdgeKind> {
        match s {
            "calls" => Some(EdgeKind::Calls),
            "inherits" => Some(EdgeKind::Inherits),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    Resolved,
    Ambiguous,
    Unresolved,
}

impl EdgeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeStatus::Resolved => "resolved",
            EdgeStatus::Ambiguous => "ambiguous",
            EdgeStatus::Unresolved => "unresolved",
        }
    }

    pub fn parse(s: &str) -> Option<EdgeStatus> {
        match s {
            "resolved" => Some(EdgeStatus::Resolved),
            "ambiguous" => Some(EdgeStatus::Ambiguous),
            "unresolved" => Some(EdgeStatus::Unresolved),
            _ => None,
        }
    }
}

/// A Calls or Inherits relationship. Contains edges are carried by
/// `Node::parent_id` instead, which keeps the forest invariant structural.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub kind: EdgeKind,
    pub status: EdgeStatus,
    /// Set only when `status` is `Resolved`.
    pub target_id: Option<String>,
    /// The literal call-site / base-name text, always preserved so the edge
    /// can be re-resolved after the graph changes.
    pub raw_name: String,
    /// All candidate ids when `status` is `Ambiguous`.
    pub candidates: Vec<String>,
    /// Receiver marker from the call site (`self`, `this`, a variable name),
    /// kept so re-resolution can replay the same-class rule.
    pub receiver: Option<String>,
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileFingerprint {
    pub path: String,
    pub hash: String,
    pub mtime: i64,
}

/// Derive the stable id for an entity: `<rel/path>:<Outer>.<Inner>`.
/// File nodes use the bare relative path, directories their relative path,
/// the project root `.`.
pub fn entity_id(rel_path: &str, scope: &[String], name: &str) -> String {
    if scope.is_empty() {
        format!("{}:{}", rel_path, name)
    } else {
        format!("{}:{}.{}", rel_path, scope.join("."), name)
    }
}

/// The file that owns a node id. Entity ids carry their file path before
/// the first `:`; file ids are their own owner. Directory ids come back
/// unchanged, which never collides with a fingerprint path.
pub fn owning_file(id: &str) -> &str {
    match id.split_once(':') {
        Some((file, _)) => file,
        None => id,
    }
}

/// Verify the Contains relation is a rooted forest with `.` as its unique
/// root: every non-root node has an existing parent and no cycle is
/// reachable. Returns `Error::Corrupt` describing the first violation.
pub fn validate_forest<'a, I>(pairs: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let pairs: Vec<(&str, Option<&str>)> = pairs.into_iter().collect();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(pairs.len());
    let mut graph: Graph<&str, (), Directed> = Graph::new();

    for (id, _) in &pairs {
        let idx = graph.add_node(*id);
        indices.insert(*id, idx);
    }

    for (id, parent) in &pairs {
        match parent {
            None => {
                if *id != ROOT_ID {
                    return Err(Error::Corrupt(format!(
                        "node {id} has no parent but is not the root"
                    )));
                }
            }
            Some(parent) => {
                let Some(parent_idx) = indices.get(parent) else {
                    return Err(Error::Corrupt(format!(
                        "node {id} references missing parent {parent}"
                    )));
                };
                graph.add_edge(*parent_idx, indices[id], ());
            }
        }
    }

    if !pairs.is_empty() && !indices.contains_key(ROOT_ID) {
        return Err(Error::Corrupt("graph has no root node".to_string()));
    }

    if petgraph::algo::is_cyclic_directed(&graph) {
        return Err(Error::Corrupt("containment cycle detected".to_string()));
    }

    Ok(())
}
