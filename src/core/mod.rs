pub mod graph;
pub mod indexer;
pub mod resolver;
pub mod scanner;

pub use graph::{Edge, EdgeKind, EdgeStatus, FileFingerprint, Node, NodeKind, ROOT_ID};
pub use indexer::{IndexReport, Indexer};
pub use resolver::{Resolution, Resolver, SymbolTable};
pub use scanner::{FileScanner, SourceFile};
