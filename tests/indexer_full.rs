use cartograph::{ExtractorRegistry, GraphStore, Indexer, Navigator};
use std::fs;
use std::path::Path;

fn write_fixture(root: &Path) {
    fs::create_dir_all(root.join("src/api")).unwrap();
    fs::write(
        root.join("src/api/users.py"),
        r#"class UserService:
    """User lookups."""

    def get_user(self, user_id):
        return load_row(user_id)

def load_row(user_id):
    return None
"#,
    )
    .unwrap();
    fs::write(
        root.join("src/util.py"),
        r#"def format_name(first, last):
    """Join a first and last name."""
    return first + " " + last
"#,
    )
    .unwrap();
}

fn index(root: &Path) -> GraphStore {
    let store = GraphStore::open_in_memory().unwrap();
    let indexer = Indexer::new(root, ExtractorRegistry::with_defaults());
    indexer.run(&store, false).unwrap();
    store
}

#[test]
fn full_index_builds_the_expected_structure() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture(dir.path());
    let store = index(dir.path());

    // Identity scheme: `<rel/path>:<Outer>.<Inner>`.
    let method = store
        .node("src/api/users.py:UserService.get_user")
        .unwrap()
        .expect("method node");
    assert_eq!(
        method.parent_id.as_deref(),
        Some("src/api/users.py:UserService")
    );

    let file = store.node("src/api/users.py").unwrap().expect("file node");
    assert_eq!(file.parent_id.as_deref(), Some("src/api"));

    let dir_node = store.node("src/api").unwrap().expect("dir node");
    assert_eq!(dir_node.parent_id.as_deref(), Some("src"));

    let root_node = store.node(".").unwrap().expect("root node");
    assert!(root_node.parent_id.is_none());

    let stats = store.subtree_stats(".").unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.classes, 1);
    assert_eq!(stats.functions, 2);
    assert_eq!(stats.methods, 1);
}

#[test]
fn file_line_range_contains_descendants() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture(dir.path());
    let store = index(dir.path());

    let file = store.node("src/api/users.py").unwrap().unwrap();
    let class = store.node("src/api/users.py:UserService").unwrap().unwrap();
    assert!(file.line_start <= class.line_start);
    assert!(class.line_end <= file.line_end);
}

#[test]
fn same_file_call_is_resolved_both_directions() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture(dir.path());
    let store = index(dir.path());
    let navigator = Navigator::new(dir.path().to_path_buf(), store).unwrap();

    let caller = navigator
        .inspect("src/api/users.py:UserService.get_user")
        .unwrap();
    let call = caller
        .calls
        .iter()
        .find(|c| c.name == "load_row")
        .expect("call edge");
    assert_eq!(call.target.as_deref(), Some("src/api/users.py:load_row"));

    let callee = navigator.inspect("src/api/users.py:load_row").unwrap();
    assert!(callee
        .called_by
        .iter()
        .any(|c| c.source == "src/api/users.py:UserService.get_user"));
}

#[test]
fn reindexing_an_unchanged_project_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture(dir.path());

    let store = GraphStore::open_in_memory().unwrap();
    let indexer = Indexer::new(dir.path(), ExtractorRegistry::with_defaults());

    let first = indexer.run(&store, false).unwrap();
    let fingerprints_first = store.fingerprints().unwrap();
    let symbols_first: Vec<String> = store
        .symbol_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    let navigator = Navigator::new(dir.path().to_path_buf(), store).unwrap();
    let scores_first: Vec<(String, f64)> = navigator
        .search("user", 10)
        .unwrap()
        .into_iter()
        .map(|hit| (hit.id, hit.score))
        .collect();

    let store = GraphStore::open_in_memory().unwrap();
    let second = indexer.run(&store, false).unwrap();
    let fingerprints_second = store.fingerprints().unwrap();
    let symbols_second: Vec<String> = store
        .symbol_entries()
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    let navigator = Navigator::new(dir.path().to_path_buf(), store).unwrap();
    let scores_second: Vec<(String, f64)> = navigator
        .search("user", 10)
        .unwrap()
        .into_iter()
        .map(|hit| (hit.id, hit.score))
        .collect();

    assert_eq!(first.files_indexed, second.files_indexed);
    assert_eq!(fingerprints_first, fingerprints_second);
    assert_eq!(symbols_first, symbols_second);
    assert_eq!(scores_first, scores_second);
}

#[test]
fn malformed_file_is_skipped_and_the_run_continues() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture(dir.path());
    // Invalid UTF-8 cannot be decoded; the file is skipped with a warning.
    fs::write(dir.path().join("src/bad.py"), [0xff, 0xfe, 0x00, 0x41]).unwrap();

    let store = GraphStore::open_in_memory().unwrap();
    let indexer = Indexer::new(dir.path(), ExtractorRegistry::with_defaults());
    let report = indexer.run(&store, false).unwrap();

    assert_eq!(report.files_skipped, 1);
    assert!(!report.warnings.is_empty());
    // The healthy files are all present.
    assert_eq!(store.subtree_stats(".").unwrap().files, 2);
}

#[test]
fn validate_accepts_a_committed_graph() {
    let dir = tempfile::TempDir::new().unwrap();
    write_fixture(dir.path());
    let store = index(dir.path());
    store.validate().unwrap();
}
