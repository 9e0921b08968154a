use cartograph::core::NodeKind;
use cartograph::extractors::{Extractor, Receiver};
use std::path::Path;

fn extract(source: &str) -> cartograph::extractors::Extraction {
    let extractor = cartograph::extractors::python::PythonExtractor::new();
    extractor.extract(Path::new("app.py"), source).unwrap()
}

const SERVICE: &str = r#"
class UserService(BaseService):
    """Manage users."""

    def get_user(self, user_id):
        """Fetch one user."""
        return self.load(user_id)

    def load(self, user_id):
        return fetch_row(user_id)

def fetch_row(user_id):
    return None
"#;

#[test]
fn classes_and_methods_carry_scope_chains() {
    let out = extract(SERVICE);

    let class = out
        .entities
        .iter()
        .find(|e| e.name == "UserService")
        .expect("class draft");
    assert_eq!(class.kind, NodeKind::Class);
    assert!(class.scope.is_empty());
    assert_eq!(class.base_classes, vec!["BaseService".to_string()]);
    assert_eq!(class.docstring.as_deref(), Some("Manage users."));

    let method = out
        .entities
        .iter()
        .find(|e| e.name == "get_user")
        .expect("method draft");
    assert_eq!(method.kind, NodeKind::Method);
    assert_eq!(method.scope, vec!["UserService".to_string()]);
    assert_eq!(method.docstring.as_deref(), Some("Fetch one user."));
    assert!(method
        .signature
        .as_deref()
        .unwrap()
        .starts_with("get_user(self"));

    let function = out
        .entities
        .iter()
        .find(|e| e.name == "fetch_row")
        .expect("function draft");
    assert_eq!(function.kind, NodeKind::Function);
    assert!(function.scope.is_empty());
}

#[test]
fn self_calls_are_marked_with_receiver() {
    let out = extract(SERVICE);

    let self_call = out
        .calls
        .iter()
        .find(|c| c.callee == "load")
        .expect("self.load call");
    assert_eq!(self_call.receiver, Receiver::SelfLike);
    assert_eq!(
        self_call.caller_scope,
        vec!["UserService".to_string(), "get_user".to_string()]
    );

    let plain_call = out
        .calls
        .iter()
        .find(|c| c.callee == "fetch_row")
        .expect("fetch_row call");
    assert_eq!(plain_call.receiver, Receiver::None);
}

#[test]
fn nested_classes_extend_the_scope_chain() {
    let out = extract(
        r#"
class Outer:
    class Inner:
        def act(self):
            pass
"#,
    );

    let inner = out.entities.iter().find(|e| e.name == "Inner").unwrap();
    assert_eq!(inner.scope, vec!["Outer".to_string()]);

    let act = out.entities.iter().find(|e| e.name == "act").unwrap();
    assert_eq!(act.scope, vec!["Outer".to_string(), "Inner".to_string()]);
}

#[test]
fn decorated_definitions_are_unwrapped() {
    let out = extract(
        r#"
@app.route("/users")
def list_users():
    pass
"#,
    );

    let func = out.entities.iter().find(|e| e.name == "list_users");
    assert!(func.is_some());
}

#[test]
fn identical_content_extracts_identically() {
    let first = extract(SERVICE);
    let second = extract(SERVICE);

    let names = |out: &cartograph::extractors::Extraction| {
        out.entities
            .iter()
            .map(|e| (e.name.clone(), e.scope.clone(), e.line_start))
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(first.calls.len(), second.calls.len());
}
