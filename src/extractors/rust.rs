use std::collections::HashMap;
use std::path::Path;
use tree_sitter::Node as TSNode;

use super::calls::{collect_calls, CallSyntax};
use super::common::{
    base_type_name, extract_text, line_span, parse_source, preceding_comment,
};
use super::{EntityDraft, Extraction, Extractor};
use crate::core::graph::NodeKind;
use crate::errors::Result;

const DOC_MARKERS: &[&str] = &["///", "//!", "//"];

pub struct RustExtractor;

impl RustExtractor {
    pub fn new() -> Self {
        Self
    }

    fn walk_items(
        &self,
        container: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
        trait_impls: &mut HashMap<String, Vec<String>>,
    ) {
        let mut cursor = container.walk();
        for child in container.children(&mut cursor) {
            match child.kind() {
                "struct_item" => self.process_type(&child, source, scope, NodeKind::Struct, out),
                "enum_item" => self.process_type(&child, source, scope, NodeKind::Enum, out),
                "trait_item" => self.process_trait(&child, source, scope, out),
                "function_item" => {
                    self.process_function(&child, source, scope, NodeKind::Function, out)
                }
                "impl_item" => self.process_impl(&child, source, scope, out, trait_impls),
                "mod_item" => {
                    // Inline modules share the file scope.
                    if let Some(body) = child.child_by_field_name("body") {
                        self.walk_items(&body, source, scope, out, trait_impls);
                    }
                }
                _ => {}
            }
        }
    }

    fn process_type(
        &self,
        node: &TSNode,
        source: &[u8],
        scope: &[String],
        kind: NodeKind,
        out: &mut Extraction,
    ) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(node);

        let mut draft = EntityDraft::new(name, kind, scope.to_vec(), start, end);
        draft.docstring = preceding_comment(node, source, DOC_MARKERS);
        out.entities.push(draft);
    }

    fn process_trait(
        &self,
        trait_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
    ) {
        let Some(name_node) = trait_node.child_by_field_name("name") else {
            return;
        };
        let name = extract_text(&name_node, source).to_string();
        let (start, end) = line_span(trait_node);

        let mut draft = EntityDraft::new(name.clone(), NodeKind::Trait, scope.to_vec(), start, end);
        draft.docstring = preceding_comment(trait_node, source, DOC_MARKERS);
        out.entities.push(draft);

        if let Some(body) = trait_node.child_by_field_name("body") {
            let mut inner_scope = scope.to_vec();
            inner_scope.push(name);
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if matches!(child.kind(), "function_item" | "function_signature_item") {
                    self.process_function(&child, source, &inner_scope, NodeKind::Method, out);
                }
            }
        }
    }

    fn process_impl(
        &self,
        impl_node: &TSNode,
        source: &[u8],
        scope: &[String],
        out: &mut Extraction,
        trait_impls: &mut HashMap<String, Vec<String>>,
    ) {
        let Some(type_node) = impl_node.child_by_field_name("type") else {
            return;
        };
        let type_name = base_type_name(extract_text(&type_node, source));

        // `impl Trait for Type` declares an inheritance-style relationship;
        // it is attached to the type's own draft after the walk.
        if let Some(trait_node) = impl_node.child_by_field_name("trait") {
            let trait_name = base_type_name(extract_text(&trait_node, source));
            trait_impls.entry(type_name.clone()).or_default().push(trait_name);
        }

        if let Some(body) = impl_node.child_by_field_name("body") {
            let mut inner_scope = scope.to_vec();
            inner_scope.push(type_name);
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                if child.kind() == "function_item" {
                    self.process_function(&child, source, &inner_scope, NodeKind::Method, out);
                }
            }
        }
    }

    fn process_function(
        &self,
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
            signature = format!("{} -> {}", signature, extract_text(&return_type, source));
        }

        let mut draft = EntityDraft::new(name, kind, scope.to_vec(), start, end);
        draft.signature = Some(signature);
        draft.docstring = preceding_comment(func_node, source, DOC_MARKERS);
        out.entities.push(draft);
    }
}

fn scope_names(node: &TSNode, source: &[u8]) -> Option<Vec<String>> {
    match node.kind() {
        "impl_item" => {
            let ty = node.child_by_field_name("type")?;
            Some(vec![base_type_name(extract_text(&ty, source))])
        }
        _ => {
            let name = node.child_by_field_name("name")?;
            Some(vec![extract_text(&name, source).to_string()])
        }
    }
}

const SYNTAX: CallSyntax = CallSyntax {
    scope_kinds: &["function_item", "impl_item", "trait_item"],
    call_kinds: &["call_expression"],
    self_markers: &["self"],
    scope_names,
};

impl Extractor for RustExtractor {
    fn language(&self) -> &'static str {
        "rust"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["rs"]
    }

    fn extract(&self, path: &Path, content: &str) -> Result<Extraction> {
        let tree = parse_source(tree_sitter_rust::language(), path, content)?;
        let source = content.as_bytes();
        let root = tree.root_node();

        let mut out = Extraction::default();
        let mut trait_impls: HashMap<String, Vec<String>> = HashMap::new();
        self.walk_items(&root, source, &[], &mut out, &mut trait_impls);

        for draft in &mut out.entities {
            if draft.kind.is_class_like() {
                if let Some(traits) = trait_impls.remove(&draft.name) {
                    draft.base_classes.extend(traits);
                }
            }
        }

        out.calls = collect_calls(&root, source, &SYNTAX);
        Ok(out)
    }
}
