use std::path::Path;
use tree_sitter::Node as TSNode;

use super::calls::{collect_calls, CallSyntax};
use super::common::{extract_text, find_child_by_kind, line_span, parse_source, python_docstring};
use super::{EntityDraft, Extraction, Extractor};
use crate::core::graph::NodeKind;
use crate::errors::Result;

pub struct PythonExtractor;

impl PythonExtractor {
    pub fn new() -> Self {
        Self
    }

    fn walk_block(
        &self,
        block: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let mut cursor = block.walk();
        for child in block.children(&mut cursor) {
            // Decorators wrap the definition they annotate.
            let definition = if child.kind() == "decorated_definition" {
                match child.child_by_field_name("definition") {
                    Some(inner) => inner,
                    None => continue,
                }
            } else {
                child
            };

            match definition.kind() {
                "class_definition" => self.process_class(&definition, source, scope, out),
                "function_definition" => self.process_function(&definition, source, scope, out),
                _ => {}
            }
        }
    }

    fn process_class(
        &self,
        class_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let Some(name_node) = class_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(class_node);

        let mut bases = Vec::new();
        if let Some(superclasses) = class_node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for arg in superclasses.children(&mut cursor) {
                match arg.kind() {
                    "identifier" | "attribute" => {
                        bases.push(extract_text(&arg, source).to_string());
                    }
                    _ => {}
                }
            }
        }

        let mut draft = EntityDraft::new(name.clone(), NodeKind::Class, scope.to_vec(), start, end);
        draft.base_classes = bases;
        if let Some(doc) = python_docstring(class_node, source) {
            draft.docstring = Some(doc);
        }
        out.entities.push(draft);

        if let Some(body) = find_child_by_kind(class_node, "block") {
            let mut inner_scope = scope.to_vec();
            inner_scope.push(name);
            self.walk_block(&body, source, &inner_scope, out);
        }
    }

    fn process_function(
        &self,
        func_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let Some(name_node) = func_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(func_node);

        // Functions directly inside a class body are methods.
        let kind = if scope.is_empty() {
            NodeKind::Function
        } else {
            NodeKind::Method
        };

        let mut signature = name.clone();
        if let Some(params) = func_node.child_by_field_name("parameters") {
            signature = format!("{}{}", name, extract_text(&params, source));
        }
        if let Some(return_type) = func_node.child_by_field_name("return_type") {
            signature = format!("{} -> {}", signature, extract_text(&return_type, source));
        }

        let mut draft = EntityDraft::new(name, kind, scope.to_vec(), start, end);
        draft.signature = Some(signature);
        if let Some(doc) = python_docstring(func_node, source) {
            draft.docstring = Some(doc);
        }
        out.entities.push(draft);
        // Nested defs are not tracked as entities; calls inside them are
        // attributed to the nearest tracked ancestor by the indexer.
    }
}

fn scope_names(node: &TSNode, source: &[u8]) -> Option<Vec<String>> {
    let name = node.child_by_field_name("name")?;
    Some(vec![extract_text(&name, source).to_string()])
}

const SYNTAX: CallSyntax = CallSyntax {
    scope_kinds: &["class_definition", "function_definition"],
    call_kinds: &["call"],
    self_markers: &["self", "cls"],
    scope_names,
};

impl Extractor for PythonExtractor {
    fn language(&self) -> &'static str {
        "python"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["py", "pyi"]
    }

    fn extract(&self, path: &Path, content: &str) -> Result<Extraction> {
        let tree = parse_source(tree_sitter_python::language(), path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut out = Extraction::default();
        self.walk_block(&root, source, &[], &mut out);
        out.calls = collect_calls(&root, source, &SYNTAX);
        Ok(out)
    }
}
