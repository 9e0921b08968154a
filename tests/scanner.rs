use cartograph::core::scanner::FileScanner;
use cartograph::extractors::ExtractorRegistry;
use std::fs;
use std::path::Path;

fn touch<P: AsRef<Path>>(p: P) {
    fs::write(p, "// test").unwrap();
}

#[test]
fn scanner_keeps_only_registered_extensions() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("a")).unwrap();
    fs::create_dir_all(root.join("b")).unwrap();

    touch(root.join("a/lib.rs"));
    touch(root.join("a/main.py"));
    touch(root.join("b/app.js"));
    touch(root.join("b/readme.txt")); // ignored

    let registry = ExtractorRegistry::with_defaults();
    let files = FileScanner::new().scan(root, &registry).unwrap();

    let mut rels: Vec<_> = files.iter().map(|f| f.rel_path.as_str()).collect();
    rels.sort();
    assert_eq!(rels, vec!["a/lib.rs", "a/main.py", "b/app.js"]);
}

#[test]
fn scanner_skips_excluded_and_hidden_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
    fs::create_dir_all(root.join("__pycache__")).unwrap();
    fs::create_dir_all(root.join(".hidden")).unwrap();

    touch(root.join("src/app.py"));
    touch(root.join("node_modules/pkg/index.js"));
    touch(root.join("__pycache__/app.py"));
    touch(root.join(".hidden/secret.py"));

    let registry = ExtractorRegistry::with_defaults();
    let files = FileScanner::new().scan(root, &registry).unwrap();

    let rels: Vec<_> = files.iter().map(|f| f.rel_path.as_str()).collect();
    assert_eq!(rels, vec!["src/app.py"]);
}

#[test]
fn scan_results_are_sorted_for_determinism() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    touch(root.join("zeta.py"));
    touch(root.join("alpha.py"));
    touch(root.join("midway.py"));

    let registry = ExtractorRegistry::with_defaults();
    let files = FileScanner::new().scan(root, &registry).unwrap();

    let rels: Vec<_> = files.iter().map(|f| f.rel_path.as_str()).collect();
    assert_eq!(rels, vec!["alpha.py", "midway.py", "zeta.py"]);
}
