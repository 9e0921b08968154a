//! Shared call-site collector.
//!
//! One AST walk per file, driven by a per-language syntax table. The walker
//! tracks the chain of named scopes (classes, impls, functions) so each call
//! fact carries the scope of its caller, and classifies the receiver so the
//! resolver can replay self-style dispatch.

use tree_sitter::Node as TSNode;

use super::common::{base_type_name, extract_text};
use super::{RawCall, Receiver};

/// Per-language syntax table for the collector.
pub struct CallSyntax {
    /// Node kinds that open a named scope (class-likes and function-likes).
    pub scope_kinds: &'static [&'static str],
    /// Node kinds that are call sites.
    pub call_kinds: &'static [&'static str],
    /// Receiver spellings treated as self-style (`self`, `this`, `cls`).
    pub self_markers: &'static [&'static str],
    /// Names a scope node contributes to the chain, outermost first.
    /// (Go methods contribute two: receiver type, then method name.)
    pub scope_names: fn(node: &TSNode, source: &[u8]) -> Option<Vec<String>>,
}

pub fn collect_calls(root: &TSNode, source: &[u8], syntax: &CallSyntax) -> Vec<RawCall> {
    let mut calls = Vec::new();
    let mut scope: Vec<String> = Vec::new();
    walk(root, source, syntax, &mut scope, &mut calls);
    calls
}

fn walk(
    node: &TSNode,
    source: &[u8],
    syntax: &CallSyntax,
    scope: &mut Vec<String>,
    calls: &mut Vec<RawCall>,
) {
    let mut pushed = 0usize;
    if syntax.scope_kinds.contains(&node.kind()) {
        if let Some(names) = (syntax.scope_names)(node, source) {
            pushed = names.len();
            scope.extend(names);
        }
    }

    if syntax.call_kinds.contains(&node.kind()) {
        if let Some((callee, receiver)) = callee_of(node, source, syntax.self_markers) {
            if !callee.is_empty() {
                calls.push(RawCall {
                    caller_scope: scope.clone(),
                    callee,
                    receiver,
                    line: node.start_position().row + 1,
                });
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(&child, source, syntax, scope, calls);
    }

    for _ in 0..pushed {
        scope.pop();
    }
}

/// Extract the callee name and receiver classification from a call node.
/// Dynamic shapes the walker cannot name (computed callees, function
/// pointers) yield `None` and are dropped rather than guessed at.
fn callee_of(call: &TSNode, source: &[u8], self_markers: &[&str]) -> Option<(String, Receiver)> {
    match call.kind() {
        // Python `call`, JS/TS/Rust/Go `call_expression`.
        "call" | "call_expression" => {
            let function = call.child_by_field_name("function")?;
            function_target(&function, source, self_markers)
        }
        // JS/TS `new Foo(...)`.
        "new_expression" => {
            let ctor = call.child_by_field_name("constructor")?;
            match ctor.kind() {
                "identifier" | "type_identifier" => {
                    Some((extract_text(&ctor, source).to_string(), Receiver::None))
                }
                "member_expression" => function_target(&ctor, source, self_markers),
                _ => None,
            }
        }
        // Java `obj.name(...)` / `name(...)`.
        "method_invocation" => {
            let name = call.child_by_field_name("name")?;
            let receiver = match call.child_by_field_name("object") {
                Some(object) => classify_receiver(extract_text(&object, source), self_markers),
                None => Receiver::None,
            };
            Some((extract_text(&name, source).to_string(), receiver))
        }
        // Java `new Foo(...)`.
        "object_creation_expression" => {
            let ty = call.child_by_field_name("type")?;
            Some((base_type_name(extract_text(&ty, source)), Receiver::None))
        }
        _ => None,
    }
}

fn function_target(
    function: &TSNode,
    source: &[u8],
    self_markers: &[&str],
) -> Option<(String, Receiver)> {
    match function.kind() {
        "identifier" | "type_identifier" => {
            Some((extract_text(function, source).to_string(), Receiver::None))
        }
        // Python `obj.method`.
        "attribute" => {
            let attr = function.child_by_field_name("attribute")?;
            let receiver = match function.child_by_field_name("object") {
                Some(object) => classify_receiver(extract_text(&object, source), self_markers),
                None => Receiver::None,
            };
            Some((extract_text(&attr, source).to_string(), receiver))
        }
        // JS/TS `obj.method`.
        "member_expression" => {
            let property = function.child_by_field_name("property")?;
            let receiver = match function.child_by_field_name("object") {
                Some(object) => classify_receiver(extract_text(&object, source), self_markers),
                None => Receiver::None,
            };
            Some((extract_text(&property, source).to_string(), receiver))
        }
        // Rust `value.method`.
        "field_expression" => {
            let field = function.child_by_field_name("field")?;
            let receiver = match function.child_by_field_name("value") {
                Some(value) => classify_receiver(extract_text(&value, source), self_markers),
                None => Receiver::None,
            };
            Some((extract_text(&field, source).to_string(), receiver))
        }
        // Go `pkg.Func` / `recv.Method`.
        "selector_expression" => {
            let field = function.child_by_field_name("field")?;
            let receiver = match function.child_by_field_name("operand") {
                Some(operand) => classify_receiver(extract_text(&operand, source), self_markers),
                None => Receiver::None,
            };
            Some((extract_text(&field, source).to_string(), receiver))
        }
        // Rust `Type::func` / `module::func`.
        "scoped_identifier" => {
            let name = function.child_by_field_name("name")?;
            let receiver = match function.child_by_field_name("path") {
                Some(path) => {
                    let text = extract_text(&path, source);
                    if text == "Self" || text == "self" {
                        Receiver::SelfLike
                    } else {
                        Receiver::Named(base_type_name(text))
                    }
                }
                None => Receiver::None,
            };
            Some((extract_text(&name, source).to_string(), receiver))
        }
        // Rust `Vec::<T>::new` style.
        "generic_function" => {
            let inner = function.child_by_field_name("function")?;
            function_target(&inner, source, self_markers)
        }
        "parenthesized_expression" => {
            let inner = function.child(0)?;
            function_target(&inner, source, self_markers)
        }
        _ => None,
    }
}

fn classify_receiver(text: &str, self_markers: &[&str]) -> Receiver {
    if self_markers.contains(&text) {
        Receiver::SelfLike
    } else {
        Receiver::Named(text.to_string())
    }
}
