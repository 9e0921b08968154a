use cartograph::core::NodeKind;
use cartograph::extractors::{Extractor, Receiver};
use std::path::Path;

fn extract(source: &str) -> cartograph::extractors::Extraction {
    let extractor = cartograph::extractors::rust::RustExtractor::new();
    extractor.extract(Path::new("lib.rs"), source).unwrap()
}

const CACHE: &str = r#"
/// A bounded cache.
pub struct Cache {
    entries: Vec<String>,
}

pub trait Evict {
    fn evict(&mut self);
}

impl Cache {
    pub fn insert(&mut self, key: String) {
        self.make_room();
        self.entries.push(key);
    }

    fn make_room(&mut self) {}
}

impl Evict for Cache {
    fn evict(&mut self) {}
}

pub fn build_cache() -> Cache {
    Cache { entries: Vec::new() }
}
"#;

#[test]
fn structs_traits_and_impl_methods_are_extracted() {
    let out = extract(CACHE);

    let cache = out.entities.iter().find(|e| e.name == "Cache").unwrap();
    assert_eq!(cache.kind, NodeKind::Struct);
    assert_eq!(cache.docstring.as_deref(), Some("A bounded cache."));

    let evict_trait = out.entities.iter().find(|e| e.name == "Evict").unwrap();
    assert_eq!(evict_trait.kind, NodeKind::Trait);

    let insert = out.entities.iter().find(|e| e.name == "insert").unwrap();
    assert_eq!(insert.kind, NodeKind::Method);
    assert_eq!(insert.scope, vec!["Cache".to_string()]);

    let build = out.entities.iter().find(|e| e.name == "build_cache").unwrap();
    assert_eq!(build.kind, NodeKind::Function);
}

#[test]
fn trait_impl_becomes_a_base_class_on_the_type() {
    let out = extract(CACHE);
    let cache = out.entities.iter().find(|e| e.name == "Cache").unwrap();
    assert_eq!(cache.base_classes, vec!["Evict".to_string()]);
}

#[test]
fn self_method_calls_carry_the_marker() {
    let out = extract(CACHE);

    let call = out
        .calls
        .iter()
        .find(|c| c.callee == "make_room")
        .expect("self.make_room call");
    assert_eq!(call.receiver, Receiver::SelfLike);
    assert_eq!(
        call.caller_scope,
        vec!["Cache".to_string(), "insert".to_string()]
    );
}

#[test]
fn scoped_calls_keep_the_trailing_name() {
    let out = extract(CACHE);
    // `Vec::new()` inside build_cache.
    let call = out.calls.iter().find(|c| c.callee == "new").unwrap();
    assert_eq!(call.receiver, Receiver::Named("Vec".to_string()));
}

#[test]
fn inline_modules_are_walked() {
    let out = extract(
        r#"
mod inner {
    pub fn hidden() {}
}
"#,
    );
    assert!(out.entities.iter().any(|e| e.name == "hidden"));
}
