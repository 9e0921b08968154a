use std::path::Path;
use tree_sitter::Node as TSNode;

use super::calls::{collect_calls, CallSyntax};
use super::common::{extract_text, find_child_by_kind, line_span, parse_source, preceding_comment};
use super::{EntityDraft, Extraction, Extractor};
use crate::core::graph::NodeKind;
use crate::errors::Result;

const DOC_MARKERS: &[&str] = &["/**", "/*", "*", "//"];

pub struct JavaScriptExtractor;

impl JavaScriptExtractor {
    pub fn new() -> Self {
        Self
    }
}

pub(super) fn walk_program(
    container: &TSNode,
    source: &[u8],
    scope: &[String],
    out: &mut Extraction,
) {
    let mut cursor = container.walk();
    for child in container.children(&mut cursor) {
        match child.kind() {
            "class_declaration" => process_class(&child, source, scope, out),
            "function_declaration" | "generator_function_declaration" => {
                process_function(&child, source, scope, NodeKind::Function, out)
            }
            // `export class X` / `export function f` wrap the declaration.
            "export_statement" => {
                if let Some(decl) = child.child_by_field_name("declaration") {
                    walk_declaration(&decl, source, scope, out);
                }
            }
            _ => {}
        }
    }
}

fn walk_declaration(decl: &TSNode, source: &[u8], scope: &[String], out: &mut Extraction) {
    match decl.kind() {
        "class_declaration" => process_class(decl, source, scope, out),
        "function_declaration" | "generator_function_declaration" => {
            process_function(decl, source, scope, NodeKind::Function, out)
        }
        _ => {}
    }
}

pub(super) fn process_class(
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
    if let Some(heritage) = find_child_by_kind(class_node, "class_heritage") {
        let mut cursor = heritage.walk();
        for part in heritage.children(&mut cursor) {
            match part.kind() {
                "identifier" | "member_expression" => {
                    bases.push(extract_text(&part, source).to_string());
                }
                _ => {}
            }
        }
    }

    let mut draft = EntityDraft::new(name.clone(), NodeKind::Class, scope.to_vec(), start, end);
    draft.base_classes = bases;
    draft.docstring = preceding_comment(class_node, source, DOC_MARKERS);
    out.entities.push(draft);

    if let Some(body) = class_node.child_by_field_name("body") {
        let mut inner_scope = scope.to_vec();
        inner_scope.push(name);
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if member.kind() == "method_definition" {
                process_function(&member, source, &inner_scope, NodeKind::Method, out);
            }
        }
    }
}

pub(super) fn process_function(
    func_node: &TSNode,
    source: &[u8],
    scope: &[String],
    kind: NodeKind,
    out: &mut Extraction,
) {
    let Some(name_node) = func_node.child_by_field_name("name") else {
        return;
    };
    let name = extract_text(&name_node, source).to_string();
    let (start, end) = line_span(func_node);

    let mut signature = name.clone();
    if let Some(params) = func_node.child_by_field_name("parameters") {
        signature = format!("{}{}", name, extract_text(&params, source));
    }
    if let Some(return_type) = func_node.child_by_field_name("return_type") {
        signature = format!("{}{}", signature, extract_text(&return_type, source));
    }

    let mut draft = EntityDraft::new(name, kind, scope.to_vec(), start, end);
    draft.signature = Some(signature);
    draft.docstring = preceding_comment(func_node, source, DOC_MARKERS);
    out.entities.push(draft);
}

fn scope_names(node: &TSNode, source: &[u8]) -> Option<Vec<String>> {
    let name = node.child_by_field_name("name")?;
    Some(vec![extract_text(&name, source).to_string()])
}

pub(super) const SYNTAX: CallSyntax = CallSyntax {
    scope_kinds: &[
        "class_declaration",
        "abstract_class_declaration",
        "function_declaration",
        "generator_function_declaration",
        "method_definition",
    ],
    call_kinds: &["call_expression", "new_expression"],
    self_markers: &["this"],
    scope_names,
};

impl Extractor for JavaScriptExtractor {
    fn language(&self) -> &'static str {
        "javascript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "mjs"]
    }

    fn extract(&self, path: &Path, content: &str) -> Result<Extraction> {
        let tree = parse_source(tree_sitter_javascript::language(), path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut out = Extraction::default();
        walk_program(&root, source, &[], &mut out);
        out.calls = collect_calls(&root, source, &SYNTAX);
        Ok(out)
    }
}
