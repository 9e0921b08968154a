use std::path::Path;
use tree_sitter::Node as TSNode;

use super::calls::{collect_calls, CallSyntax};
use super::common::{extract_text, line_span, parse_source, preceding_comment};
use super::{EntityDraft, Extraction, Extractor};
use crate::core::graph::NodeKind;
use crate::errors::Result;

const DOC_MARKERS: &[&str] = &["//"];

pub struct GoExtractor;

impl GoExtractor {
    pub fn new() -> Self {
        Self
    }

    fn process_type_declaration(
        &self,
        decl: &TSNode,
        source: &[u8],
        out: &mut Extraction,
    ) {
        let mut cursor = decl.walk();
        for spec in decl.children(&mut cursor) {
            if spec.kind() != "type_spec" {
                continue;
            }
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let Some(type_node) = spec.child_by_field_name("type") else {
                continue;
            };
            let kind = match type_node.kind() {
                "struct_type" => NodeKind::Struct,
                "interface_type" => NodeKind::Interface,
                _ => continue,
            };

            let name = extract_text(&name_node, source).to_string();
            let (start, end) = line_span(&spec);
            let mut draft = EntityDraft::new(name, kind, Vec::new(), start, end);
            draft.docstring = preceding_comment(decl, source, DOC_MARKERS);
            out.entities.push(draft);
        }
    }

    fn process_function(
        &self,
        func_node: &TSNode,
        source: &[u8],
        out: &mut Extraction,
    ) {
        let Some(name_node) = func_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(func_node);

        // Methods carry their receiver type as enclosing scope.
        let (kind, scope) = match receiver_type(func_node, source) {
            Some(receiver) => (NodeKind::Method, vec![receiver]),
            None => (NodeKind::Function, Vec::new()),
        };

        let mut signature = name.clone();
        if let Some(params) = func_node.child_by_field_name("parameters") {
            signature = format!("{}{}", name, extract_text(&params, source));
        }
        if let Some(result) = func_node.child_by_field_name("result") {
            signature = format!("{} {}", signature, extract_text(&result, source));
        }

        let mut draft = EntityDraft::new(name, kind, scope, start, end);
        draft.signature = Some(signature);
        draft.docstring = preceding_comment(func_node, source, DOC_MARKERS);
        out.entities.push(draft);
    }
}

/// Receiver type name of a method declaration, pointer stripped.
fn receiver_type(func_node: &TSNode, source: &[u8]) -> Option<String> {
    let receiver = func_node.child_by_field_name("receiver")?;
    let mut cursor = receiver.walk();
    for param in receiver.children(&mut cursor) {
        if param.kind() != "parameter_declaration" {
            continue;
        }
        let ty = param.child_by_field_name("type")?;
        let text = extract_text(&ty, source).trim_start_matches('*');
        return Some(text.to_string());
    }
    None
}

fn scope_names(node: &TSNode, source: &[u8]) -> Option<Vec<String>> {
    let name = node.child_by_field_name("name")?;
    let name = extract_text(&name, source).to_string();
    match receiver_type(node, source) {
        Some(receiver) => Some(vec![receiver, name]),
        None => Some(vec![name]),
    }
}

const SYNTAX: CallSyntax = CallSyntax {
    scope_kinds: &["function_declaration", "method_declaration"],
    call_kinds: &["call_expression"],
    self_markers: &[],
    scope_names,
};

impl Extractor for GoExtractor {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn extract(&self, path: &Path, content: &str) -> Result<Extraction> {
        let tree = parse_source(tree_sitter_go::language(), path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut out = Extraction::default();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            match child.kind() {
                "type_declaration" => self.process_type_declaration(&child, source, &mut out),
                "function_declaration" | "method_declaration" => {
                    self.process_function(&child, source, &mut out)
                }
                _ => {}
            }
        }
        out.calls = collect_calls(&root, source, &SYNTAX);
        Ok(out)
    }
}
