use cartograph::core::graph::{Node, NodeKind};
use cartograph::errors::Error;
use cartograph::GraphStore;

fn node(id: &str, parent: Option<&str>, kind: NodeKind) -> Node {
    Node::new(
        id.to_string(),
        parent.map(str::to_string),
        id.rsplit('/').next().unwrap().to_string(),
        kind,
    )
}

#[test]
fn a_failed_transaction_rolls_back_completely() {
    let store = GraphStore::open_in_memory().unwrap();

    store
        .write(|tx| {
            tx.upsert_node(&node(".", None, NodeKind::Directory))?;
            tx.upsert_node(&node("a.py", Some("."), NodeKind::File))?;
            Ok(())
        })
        .unwrap();

    // A run that writes rows and then fails must leave no trace.
    let result: Result<(), Error> = store.write(|tx| {
        tx.upsert_node(&node("b.py", Some("."), NodeKind::File))?;
        tx.bump_epoch()?;
        Err(Error::Corrupt("injected failure".to_string()))
    });
    assert!(result.is_err());

    assert!(store.node("b.py").unwrap().is_none());
    assert!(store.node("a.py").unwrap().is_some());
    assert_eq!(store.epoch().unwrap(), 0);
}

#[test]
fn committed_writes_bump_the_epoch() {
    let store = GraphStore::open_in_memory().unwrap();
    assert_eq!(store.epoch().unwrap(), 0);

    store
        .write(|tx| {
            tx.upsert_node(&node(".", None, NodeKind::Directory))?;
            tx.bump_epoch()?;
            Ok(())
        })
        .unwrap();
    assert_eq!(store.epoch().unwrap(), 1);
}

#[test]
fn validate_flags_a_missing_parent_as_corrupt() {
    let store = GraphStore::open_in_memory().unwrap();
    store
        .write(|tx| {
            tx.upsert_node(&node(".", None, NodeKind::Directory))?;
            // References a parent that was never written.
            tx.upsert_node(&node("ghost.py", Some("missing-dir"), NodeKind::File))?;
            Ok(())
        })
        .unwrap();

    match store.validate() {
        Err(Error::Corrupt(_)) => {}
        other => panic!("expected Corrupt, got {other:?}"),
    }
}

#[test]
fn validate_flags_a_fingerprint_without_its_file_node() {
    let store = GraphStore::open_in_memory().unwrap();
    store
        .write(|tx| {
            tx.upsert_node(&node(".", None, NodeKind::Directory))?;
            tx.upsert_fingerprint(&cartograph::core::graph::FileFingerprint {
                path: "orphan.py".to_string(),
                hash: "deadbeef".to_string(),
                mtime: 0,
            })?;
            Ok(())
        })
        .unwrap();

    match store.validate() {
        Err(Error::Corrupt(message)) => assert!(message.contains("orphan.py")),
        other => panic!("expected Corrupt, got {other:?}"),
    }
}

#[test]
fn search_document_deltas_adjust_statistics_both_ways() {
    let store = GraphStore::open_in_memory().unwrap();

    let mut counts = std::collections::BTreeMap::new();
    counts.insert("parser".to_string(), 2i64);
    counts.insert("token".to_string(), 1i64);

    store
        .write(|tx| {
            tx.upsert_node(&node(".", None, NodeKind::Directory))?;
            tx.add_search_document("a.py:parse", &counts)?;
            tx.add_search_document("b.py:lex", &counts)?;
            Ok(())
        })
        .unwrap();
    assert_eq!(store.doc_count().unwrap(), 2);
    assert_eq!(store.term_df("parser").unwrap(), 2);

    store
        .write(|tx| {
            tx.remove_search_document("a.py:parse")?;
            Ok(())
        })
        .unwrap();
    assert_eq!(store.doc_count().unwrap(), 1);
    assert_eq!(store.term_df("parser").unwrap(), 1);
    assert_eq!(store.term_postings("parser").unwrap().len(), 1);

    store
        .write(|tx| {
            tx.remove_search_document("b.py:lex")?;
            Ok(())
        })
        .unwrap();
    assert_eq!(store.doc_count().unwrap(), 0);
    // Terms with zero remaining documents are dropped entirely.
    assert_eq!(store.term_df("parser").unwrap(), 0);
}
