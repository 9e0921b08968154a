use std::path::Path;
use tree_sitter::{Language, Node as TSNode, Parser, Tree};

use crate::errors::{Error, Result};

/// Parse file text with the given grammar. A grammar mismatch or parser
/// failure is a recoverable extraction error, never a panic.
pub fn parse_source(language: Language, path: &Path, content: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|err| Error::Extraction {
            path: path.display().to_string(),
            reason: format!("grammar rejected: {err}"),
        })?;
    parser.parse(content, None).ok_or_else(|| Error::Extraction {
        path: path.display().to_string(),
        reason: "parser produced no tree".to_string(),
    })
}

pub fn extract_text<'a>(node: &TSNode, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}

/// 1-based inclusive line span of a node.
pub fn line_span(node: &TSNode) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

pub fn find_child_by_kind<'a>(node: &'a TSNode, kind: &str) -> Option<TSNode<'a>> {
    for child in node.children(&mut node.walk()) {
        if child.kind() == kind {
            return Some(child);
        }
    }
    None
}

pub fn find_children_by_kind<'a>(node: &'a TSNode<'a>, kind: &str) -> Vec<TSNode<'a>> {
    let mut results = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == kind {
            results.push(child);
        }
    }
    results
}

/// Python-style docstring: first statement of a body block when it is a
/// triple-quoted string expression.
pub fn python_docstring(definition: &TSNode, source: &[u8]) -> Option<String> {
    let body = find_child_by_kind(definition, "block")?;
    let first = body.child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let string_node = first.child(0)?;
    if string_node.kind() != "string" {
        return None;
    }
    let text = extract_text(&string_node, source);
    if text.starts_with("\"\"\"") || text.starts_with("'''") {
        Some(text.trim_matches(|c| c == '"' || c == '\'').trim().to_string())
    } else {
        None
    }
}

/// Contiguous run of comment lines immediately above a declaration, with
/// the comment markers stripped. Used for `///`, `//`, `/** */` style docs.
pub fn preceding_comment(node: &TSNode, source: &[u8], markers: &[&str]) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = node.prev_sibling();

    while let Some(sibling) = current {
        let kind = sibling.kind();
        if !(kind == "comment" || kind == "line_comment" || kind == "block_comment") {
            break;
        }
        // Only comments touching the declaration (no blank line between).
        if node.start_position().row - sibling.end_position().row > lines.len() + 1 {
            break;
        }
        let raw = extract_text(&sibling, source);
        lines.push(strip_comment_markers(raw, markers));
        current = sibling.prev_sibling();
    }

    if lines.is_empty() {
        return None;
    }
    lines.reverse();
    let joined = lines.join("\n").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn strip_comment_markers(raw: &str, markers: &[&str]) -> String {
    let mut out = Vec::new();
    for line in raw.lines() {
        let mut trimmed = line.trim();
        for marker in markers {
            if let Some(rest) = trimmed.strip_prefix(marker) {
                trimmed = rest.trim_start();
                break;
            }
        }
        trimmed = trimmed.trim_end_matches("*/").trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
    }
    out.join("\n")
}

/// Strip a trailing generic parameter list from a type name: `Foo<T>` -> `Foo`.
pub fn base_type_name(text: &str) -> String {
    match text.find('<') {
        Some(idx) => text[..idx].trim().to_string(),
        None => text.trim().to_string(),
    }
}
