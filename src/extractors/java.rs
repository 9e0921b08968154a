use std::path::Path;
use tree_sitter::Node as TSNode;

use super::calls::{collect_calls, CallSyntax};
use super::common::{base_type_name, extract_text, line_span, parse_source, preceding_comment};
use super::{EntityDraft, Extraction, Extractor};
use crate::core::graph::NodeKind;
use crate::errors::Result;

const DOC_MARKERS: &[&str] = &["/**", "/*", "*", "//"];

pub struct JavaExtractor;

impl JavaExtractor {
    pub fn new() -> Self {
        Self
    }

    fn walk_declarations(
        &self,
        container: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let mut cursor = container.walk();
        for child in container.children(&mut cursor) {
            match child.kind() {
                "class_declaration" => {
                    self.process_class_like(&child, source, scope, NodeKind::Class, out)
                }
                "interface_declaration" => {
                    self.process_class_like(&child, source, scope, NodeKind::Interface, out)
                }
                "enum_declaration" => {
                    self.process_class_like(&child, source, scope, NodeKind::Enum, out)
                }
                _ => {}
            }
        }
    }

    fn process_class_like(
        &self,
        decl: &TSNode,
        source: &[u8],
        scope: &[String],
        kind: NodeKind,
        out: &mut Extraction,
    ) {
        let Some(name_node) = decl.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(decl);

        let mut bases = Vec::new();
        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            match child.kind() {
                // `extends X` on classes, `extends A, B` on interfaces,
                // `implements I` on classes.
                "superclass" | "super_interfaces" | "extends_interfaces" => {
                    collect_type_names(&child, source, &mut bases);
                }
                _ => {}
            }
        }

        let mut draft = EntityDraft::new(name.clone(), kind, scope.to_vec(), start, end);
        draft.base_classes = bases;
        draft.docstring = preceding_comment(decl, source, DOC_MARKERS);
        out.entities.push(draft);

        if let Some(body) = decl.child_by_field_name("body") {
            let mut inner_scope = scope.to_vec();
            inner_scope.push(name);
            let mut cursor = body.walk();
            for member in body.children(&mut cursor) {
                match member.kind() {
                    "method_declaration" | "constructor_declaration" => {
                        self.process_method(&member, source, &inner_scope, out)
                    }
                    "class_declaration" => {
                        self.process_class_like(&member, source, &inner_scope, NodeKind::Class, out)
                    }
                    "interface_declaration" => self.process_class_like(
                        &member,
                        source,
                        &inner_scope,
                        NodeKind::Interface,
                        out,
                    ),
                    "enum_declaration" => {
                        self.process_class_like(&member, source, &inner_scope, NodeKind::Enum, out)
                    }
                    _ => {}
                }
            }
        }
    }

    fn process_method(
        &self,
        method_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let Some(name_node) = method_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(method_node);

        let mut signature = name.clone();
        if let Some(params) = method_node.child_by_field_name("parameters") {
            signature = format!("{}{}", name, extract_text(&params, source));
        }
        if let Some(return_type) = method_node.child_by_field_name("type") {
            signature = format!("{} {}", extract_text(&return_type, source), signature);
        }

        let mut draft = EntityDraft::new(name, NodeKind::Method, scope.to_vec(), start, end);
        draft.signature = Some(signature);
        draft.docstring = preceding_comment(method_node, source, DOC_MARKERS);
        out.entities.push(draft);
    }
}

fn collect_type_names(clause: &TSNode, source: &[u8], bases: &mut Vec<String>) {
    let mut cursor = clause.walk();
    for part in clause.children(&mut cursor) {
        match part.kind() {
            "type_identifier" | "scoped_type_identifier" => {
                bases.push(base_type_name(extract_text(&part, source)));
            }
            "generic_type" | "type_list" => collect_type_names(&part, source, bases),
            _ => {}
        }
    }
}

fn scope_names(node: &TSNode, source: &[u8]) -> Option<Vec<String>> {
    let name = node.child_by_field_name("name")?;
    Some(vec![extract_text(&name, source).to_string()])
}

const SYNTAX: CallSyntax = CallSyntax {
    scope_kinds: &[
        "class_declaration",
        "interface_declaration",
        "enum_declaration",
        "method_declaration",
        "constructor_declaration",
    ],
    call_kinds: &["method_invocation", "object_creation_expression"],
    self_markers: &["this"],
    scope_names,
};

impl Extractor for JavaExtractor {
    fn language(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["java"]
    }

    fn extract(&self, path: &Path, content: &str) -> Result<Extraction> {
        let tree = parse_source(tree_sitter_java::language(), path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut out = Extraction::default();
        self.walk_declarations(&root, source, &[], &mut out);
        out.calls = collect_calls(&root, source, &SYNTAX);
        Ok(out)
    }
}
