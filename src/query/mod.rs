//! Read-only operations over the committed graph: map, expand, inspect,
//! hierarchy, search, read. Results are serializable structs; errors are
//! typed, never a crash.

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

use crate::core::graph::{EdgeKind, EdgeStatus, Node, NodeKind, ROOT_ID};
use crate::errors::{Error, Result};
use crate::search::{SearchEngine, SearchHit};
use crate::store::{GraphStore, SubtreeStats};

#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub parent_id: Option<String>,
    pub line_start: usize,
    pub line_end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base_classes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base_refs: Vec<String>,
}

impl From<Node> for NodeView {
    fn from(node: Node) -> Self {
        Self {
            id: node.id,
            name: node.name,
            kind: node.kind,
            parent_id: node.parent_id,
            line_start: node.line_start,
            line_end: node.line_end,
            signature: node.signature,
            docstring: node.docstring,
            base_classes: node.base_classes,
            base_refs: node.base_refs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildView {
    #[serde(flatten)]
    pub node: NodeView,
    pub stats: SubtreeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct MapView {
    #[serde(flatten)]
    pub root: NodeView,
    pub stats: SubtreeStats,
    pub children: Vec<ChildView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpandView {
    #[serde(flatten)]
    pub node: NodeView,
    pub children: Vec<ChildView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallView {
    pub name: String,
    pub status: EdgeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallerView {
    pub source: String,
    pub status: EdgeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectView {
    #[serde(flatten)]
    pub node: NodeView,
    pub calls: Vec<CallView>,
    pub called_by: Vec<CallerView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubclassView {
    #[serde(flatten)]
    pub node: NodeView,
    /// The base-name text through which this subclass references the class.
    pub via: String,
    pub status: EdgeStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct HierarchyView {
    pub class_name: String,
    /// Direct subclasses only; indirect descendants are reachable by
    /// walking the hierarchy query again per subclass.
    pub subclasses: Vec<SubclassView>,
}

/// Read-side facade over a committed graph. Construction validates store
/// consistency so corruption surfaces to the operator, not mid-query.
pub struct Navigator {
    root: PathBuf,
    store: GraphStore,
    search: SearchEngine,
}

impl Navigator {
    pub fn new(root: PathBuf, store: GraphStore) -> Result<Self> {
        store.validate()?;
        Ok(Self {
            root,
            store,
            search: SearchEngine::new(),
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Subtree overview: counts for the node plus one level of children.
    pub fn map(&self, path: Option<&str>) -> Result<MapView> {
        let id = normalize_id(path.unwrap_or(ROOT_ID));
        let node = self.require_node(&id)?;
        let stats = self.store.subtree_stats(&id)?;
        let children = self.child_views(&id)?;
        Ok(MapView {
            root: node.into(),
            stats,
            children,
        })
    }

    /// Immediate children of a node.
    pub fn expand(&self, path: &str) -> Result<ExpandView> {
        let id = normalize_id(path);
        let node = self.require_node(&id)?;
        let children = self.child_views(&id)?;
        Ok(ExpandView {
            node: node.into(),
            children,
        })
    }

    /// Node detail plus outgoing calls and the inverted `called_by` set.
    pub fn inspect(&self, id: &str) -> Result<InspectView> {
        let id = normalize_id(id);
        let node = self.require_node(&id)?;

        let calls = self
            .store
            .edges_from(&id)?
            .into_iter()
            .filter(|edge| edge.kind == EdgeKind::Calls)
            .map(|edge| CallView {
                name: edge.raw_name,
                status: edge.status,
                target: edge.target_id,
                candidates: edge.candidates,
                line: edge.line,
            })
            .collect();

        // called_by is computed by inverting the stored Calls edges, not
        // stored redundantly.
        let called_by = self
            .store
            .edges_to(&id)?
            .into_iter()
            .filter(|edge| edge.kind == EdgeKind::Calls)
            .map(|edge| CallerView {
                source: edge.source_id,
                status: edge.status,
                line: edge.line,
            })
            .collect();

        Ok(InspectView {
            node: node.into(),
            calls,
            called_by,
        })
    }

    /// Direct subclasses of a class name, through resolved or raw base
    /// references.
    pub fn hierarchy(&self, class_name: &str) -> Result<HierarchyView> {
        let subclasses = self
            .store
            .subclass_edges(class_name)?
            .into_iter()
            .map(|(node, edge)| SubclassView {
                node: node.into(),
                via: edge.raw_name,
                status: edge.status,
            })
            .collect();
        Ok(HierarchyView {
            class_name: class_name.to_string(),
            subclasses,
        })
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        self.search.search(&self.store, query, limit)
    }

    /// Raw text of a file, optionally restricted to a 1-based inclusive
    /// line range. Paths resolving outside the project root are rejected —
    /// a security boundary, not a convenience.
    pub fn read(&self, file: &str, start: Option<usize>, end: Option<usize>) -> Result<String> {
        // Entity ids are accepted; everything after `:` names an entity
        // inside the file.
        let file_part = file.split(':').next().unwrap_or(file);
        let resolved = self.resolve_in_root(file_part)?;

        if !resolved.is_file() {
            return Err(Error::NotFound(file_part.to_string()));
        }
        let content = std::fs::read_to_string(&resolved)?;

        match (start, end) {
            (None, None) => Ok(content),
            (start, end) => {
                let lines: Vec<&str> = content.lines().collect();
                let from = start.unwrap_or(1).max(1) - 1;
                let to = end.unwrap_or(lines.len()).min(lines.len());
                if from >= to {
                    return Ok(String::new());
                }
                Ok(lines[from..to].join("\n"))
            }
        }
    }

    fn require_node(&self, id: &str) -> Result<Node> {
        self.store
            .node(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    fn child_views(&self, id: &str) -> Result<Vec<ChildView>> {
        let mut views = Vec::new();
        for child in self.store.children(id)? {
            let stats = self.store.subtree_stats(&child.id)?;
            views.push(ChildView {
                node: child.into(),
                stats,
            });
        }
        Ok(views)
    }

    /// Join `file` onto the project root and refuse anything that escapes
    /// it, lexically or through symlinks.
    fn resolve_in_root(&self, file: &str) -> Result<PathBuf> {
        let candidate = Path::new(file);
        if candidate.is_absolute() {
            return Err(Error::OutOfScopePath(file.to_string()));
        }
        // Lexical check first: a `..` escape is rejected even when the
        // target does not exist.
        let mut depth: isize = 0;
        for component in candidate.components() {
            match component {
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(Error::OutOfScopePath(file.to_string()));
                    }
                }
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::OutOfScopePath(file.to_string()));
                }
            }
        }

        let joined = self.root.join(candidate);
        if !joined.exists() {
            return Err(Error::NotFound(file.to_string()));
        }
        let canonical_root = self.root.canonicalize()?;
        let canonical = joined.canonicalize()?;
        if !canonical.starts_with(&canonical_root) {
            return Err(Error::OutOfScopePath(file.to_string()));
        }
        Ok(canonical)
    }
}

/// Map the empty path and `/`-suffixed paths onto stored ids.
fn normalize_id(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed == ROOT_ID {
        ROOT_ID.to_string()
    } else {
        trimmed.trim_start_matches("./").to_string()
    }
}
