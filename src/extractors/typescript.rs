use std::path::Path;
use tree_sitter::Node as TSNode;

use super::calls::collect_calls;
use super::common::{extract_text, find_child_by_kind, line_span, parse_source, preceding_comment};
use super::javascript;
use super::{EntityDraft, Extraction, Extractor};
use crate::core::graph::NodeKind;
use crate::errors::Result;

const DOC_MARKERS: &[&str] = &["/**", "/*", "*", "//"];

pub struct TypeScriptExtractor;

impl TypeScriptExtractor {
    pub fn new() -> Self {
        Self
    }

    fn walk_program(
        &self,
        container: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let mut cursor = container.walk();
        for child in container.children(&mut cursor) {
            self.walk_declaration(&child, source, scope, out);
        }
    }

    fn walk_declaration(
        &self,
        decl: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        match decl.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                self.process_class(decl, source, scope, out)
            }
            "interface_declaration" => self.process_interface(decl, source, scope, out),
            "enum_declaration" => self.process_enum(decl, source, scope, out),
            "function_declaration" | "generator_function_declaration" => {
                javascript::process_function(decl, source, scope, NodeKind::Function, out)
            }
            "export_statement" => {
                if let Some(inner) = decl.child_by_field_name("declaration") {
                    self.walk_declaration(&inner, source, scope, out);
                }
            }
            _ => {}
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

        // `extends` and `implements` both feed base_classes, in source order.
        let mut bases = Vec::new();
        if let Some(heritage) = find_child_by_kind(class_node, "class_heritage") {
            collect_heritage_names(&heritage, source, &mut bases);
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
                if matches!(member.kind(), "method_definition" | "abstract_method_signature") {
                    javascript::process_function(
                        &member,
                        source,
                        &inner_scope,
                        NodeKind::Method,
                        out,
                    );
                }
            }
        }
    }

    fn process_interface(
        &self,
        interface_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let Some(name_node) = interface_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(interface_node);

        let mut bases = Vec::new();
        let mut cursor = interface_node.walk();
        for child in interface_node.children(&mut cursor) {
            if matches!(child.kind(), "extends_clause" | "extends_type_clause") {
                collect_heritage_names(&child, source, &mut bases);
            }
        }

        let mut draft =
            EntityDraft::new(name, NodeKind::Interface, scope.to_vec(), start, end);
        draft.base_classes = bases;
        draft.docstring = preceding_comment(interface_node, source, DOC_MARKERS);
        out.entities.push(draft);
    }

    fn process_enum(
        &self,
        enum_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let Some(name_node) = enum_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(enum_node);

        let mut draft = EntityDraft::new(name, NodeKind::Enum, scope.to_vec(), start, end);
        draft.docstring = preceding_comment(enum_node, source, DOC_MARKERS);
        out.entities.push(draft);
    }
}

fn collect_heritage_names(clause: &TSNode, source: &[u8], bases: &mut Vec<String>) {
    let mut cursor = clause.walk();
    for part in clause.children(&mut cursor) {
        match part.kind() {
            "identifier" | "type_identifier" | "member_expression" | "nested_type_identifier" => {
                bases.push(extract_text(&part, source).to_string());
            }
            "extends_clause" | "implements_clause" => {
                collect_heritage_names(&part, source, bases);
            }
            "generic_type" => {
                if let Some(inner) = part.child(0) {
                    bases.push(extract_text(&inner, source).to_string());
                }
            }
            _ => {}
        }
    }
}

impl Extractor for TypeScriptExtractor {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "tsx"]
    }

    fn extract(&self, path: &Path, content: &str) -> Result<Extraction> {
        let language = if path.extension().is_some_and(|ext| ext == "tsx") {
            tree_sitter_typescript::language_tsx()
        } else {
            tree_sitter_typescript::language_typescript()
        };
        let tree = parse_source(language, path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut out = Extraction::default();
        self.walk_program(&root, source, &[], &mut out);
        out.calls = collect_calls(&root, source, &javascript::SYNTAX);
        Ok(out)
    }
}
