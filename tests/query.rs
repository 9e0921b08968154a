use cartograph::errors::Error;
use cartograph::{ExtractorRegistry, GraphStore, Indexer, Navigator};
use std::fs;
use std::path::Path;

fn fixture(root: &Path) -> Navigator {
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src/models.py"),
        r#"class Base:
    pass

class Admin(Base):
    pass

class Ghost(ExternalBase):
    pass
"#,
    )
    .unwrap();
    fs::write(
        root.join("src/app.py"),
        r#"def run():
    return step_one()

def step_one():
    return 1
"#,
    )
    .unwrap();

    let store = GraphStore::open_in_memory().unwrap();
    Indexer::new(root, ExtractorRegistry::with_defaults())
        .run(&store, false)
        .unwrap();
    Navigator::new(root.to_path_buf(), store).unwrap()
}

#[test]
fn map_aggregates_counts_one_level_down() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    let view = navigator.map(None).unwrap();
    assert_eq!(view.root.id, ".");
    assert_eq!(view.stats.files, 2);
    assert_eq!(view.stats.classes, 3);
    assert_eq!(view.stats.functions, 2);

    // One level of children: the src directory with its own counts.
    assert_eq!(view.children.len(), 1);
    assert_eq!(view.children[0].node.id, "src");
    assert_eq!(view.children[0].stats.files, 2);
}

#[test]
fn expand_lists_immediate_children() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    let view = navigator.expand("src/models.py").unwrap();
    let names: Vec<&str> = view.children.iter().map(|c| c.node.name.as_str()).collect();
    assert!(names.contains(&"Base"));
    assert!(names.contains(&"Admin"));
    assert!(names.contains(&"Ghost"));
}

#[test]
fn expand_of_a_missing_node_is_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    match navigator.expand("src/nope.py") {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn inspect_shows_calls_and_called_by() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    let run = navigator.inspect("src/app.py:run").unwrap();
    assert!(run
        .calls
        .iter()
        .any(|c| c.target.as_deref() == Some("src/app.py:step_one")));

    let step = navigator.inspect("src/app.py:step_one").unwrap();
    assert!(step.called_by.iter().any(|c| c.source == "src/app.py:run"));
}

#[test]
fn hierarchy_lists_direct_subclasses_resolved_and_external() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    let view = navigator.hierarchy("Base").unwrap();
    assert_eq!(view.subclasses.len(), 1);
    assert_eq!(view.subclasses[0].node.name, "Admin");

    // An unresolvable (library) base still answers hierarchy by raw name.
    let view = navigator.hierarchy("ExternalBase").unwrap();
    assert_eq!(view.subclasses.len(), 1);
    assert_eq!(view.subclasses[0].node.name, "Ghost");
}

#[test]
fn base_refs_record_resolved_bases_and_leave_external_ones_raw() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    let admin = navigator.inspect("src/models.py:Admin").unwrap();
    assert_eq!(admin.node.base_classes, vec!["Base".to_string()]);
    assert_eq!(admin.node.base_refs, vec!["src/models.py:Base".to_string()]);

    let ghost = navigator.inspect("src/models.py:Ghost").unwrap();
    assert_eq!(ghost.node.base_classes, vec!["ExternalBase".to_string()]);
    assert!(ghost.node.base_refs.is_empty());
}

#[test]
fn read_returns_file_contents_and_line_ranges() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    let all = navigator.read("src/app.py", None, None).unwrap();
    assert!(all.contains("def run():"));

    let slice = navigator.read("src/app.py", Some(1), Some(2)).unwrap();
    assert_eq!(slice, "def run():\n    return step_one()");

    // Entity ids resolve to their owning file.
    let via_entity = navigator.read("src/app.py:run", None, None).unwrap();
    assert_eq!(via_entity, all);
}

#[test]
fn read_rejects_paths_escaping_the_project_root() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());
    // A real file outside the root must stay unreachable.
    fs::write(dir.path().parent().unwrap().join("outside.txt"), "secret").ok();

    match navigator.read("../outside.txt", None, None) {
        Err(Error::OutOfScopePath(_)) => {}
        other => panic!("expected OutOfScopePath, got {other:?}"),
    }

    match navigator.read("src/../../outside.txt", None, None) {
        Err(Error::OutOfScopePath(_)) => {}
        other => panic!("expected OutOfScopePath, got {other:?}"),
    }

    match navigator.read("/etc/hostname", None, None) {
        Err(Error::OutOfScopePath(_)) => {}
        other => panic!("expected OutOfScopePath, got {other:?}"),
    }
}

#[test]
fn read_of_a_missing_file_inside_the_root_is_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let navigator = fixture(dir.path());

    match navigator.read("src/missing.py", None, None) {
        Err(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}
