//! Document store integration tests

use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use serde_json::json;
use xfcollab::backend::error::{BackendError, ErrorKind};
use xfcollab::shared::{Change, Transaction};

use crate::common::{insert, remove, single, TestDatabase};
use crate::{assert_document, assert_err, assert_ok};

#[tokio::test]
async fn test_round_trip_across_reconnect() {
    let db = TestDatabase::new();
    let store = db.connect().await;

    assert_eq!(assert_ok!(store.load("notes").await), Change::empty(0));

    let first = Change::new(
        0,
        vec![insert(0, "Hello"), insert(5, " world")],
        vec![None, Some(json!({ "h1": { "type": "bold" } }))],
        BTreeMap::new(),
    )
    .unwrap();
    let second = single(2, remove(0, "Hello"));
    assert_ok!(store.on_new_change("notes", &first).await);
    assert_ok!(store.on_new_change("notes", &second).await);
    store.on_close().await;

    let reopened = db.connect().await;
    let history = assert_ok!(reopened.load("notes").await);
    assert_eq!(history, first.concat(&second).unwrap());
    assert_document!(history, " world");
    assert_eq!(reopened.list_documents().await.unwrap(), vec!["notes".to_string()]);
}

#[tokio::test]
async fn test_server_id_shared_by_instances() {
    let db = TestDatabase::new();
    let a = db.connect().await;
    let b = db.connect().await;
    assert_eq!(a.server_id(), b.server_id());
}

#[tokio::test]
async fn test_stale_start_on_same_instance() {
    let db = TestDatabase::new();
    let store = db.connect().await;
    store.load("doc").await.unwrap();
    store.on_new_change("doc", &single(0, insert(0, "a"))).await.unwrap();

    let result = store.on_new_change("doc", &single(0, insert(0, "b"))).await;
    assert_err!(
        result,
        BackendError::UnmatchedStarts { expected: 1, found: 0, .. }
    );

    // Nothing from the rejected append was written
    let history = store.load("doc").await.unwrap();
    assert_eq!(history.length(), 1);
    assert_document!(history, "a");
}

#[tokio::test]
async fn test_exclusive_append_across_instances() {
    let db = TestDatabase::new();
    let a = db.connect().await;
    let b = db.connect().await;
    a.load("doc").await.unwrap();
    b.load("doc").await.unwrap();

    a.on_new_change("doc", &single(0, insert(0, "from a"))).await.unwrap();
    let lost = b.on_new_change("doc", &single(0, insert(0, "from b"))).await;
    let err = match lost {
        Err(e) => e,
        Ok(()) => panic!("second writer at the same position must lose"),
    };
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.requires_resync());
    assert_err!(
        Err::<(), _>(err),
        BackendError::UnmatchedStarts { expected: 1, found: 0, .. }
    );

    // After reloading, the losing instance appends behind the winner
    let history = b.load("doc").await.unwrap();
    assert_document!(history, "from a");
    b.on_new_change("doc", &single(1, insert(6, "!"))).await.unwrap();
    assert_document!(a.load("doc").await.unwrap(), "from a!");
}

#[tokio::test]
async fn test_append_requires_load() {
    let db = TestDatabase::new();
    let store = db.connect().await;
    let result = store
        .on_new_change("never-loaded", &single(0, insert(0, "x")))
        .await;
    assert_err!(result, BackendError::DocumentNotLoaded { .. });
}

#[tokio::test]
async fn test_drop_database_forgets_everything() {
    let db = TestDatabase::new();
    let store = db.connect().await;
    store.load("a").await.unwrap();
    store.load("b").await.unwrap();
    store
        .on_new_change("a", &Change::from_transactions(0, vec![Transaction::insertion(0, vec![json!("x")])]))
        .await
        .unwrap();

    store.drop_database().await.unwrap();
    assert!(store.list_documents().await.unwrap().is_empty());
    assert_err!(
        store.on_new_change("a", &single(1, insert(1, "y"))).await,
        BackendError::DocumentNotLoaded { .. }
    );

    // A fresh connection mints a new server id
    let reopened = db.connect().await;
    assert_ne!(reopened.server_id(), store.server_id());
    assert_eq!(reopened.load("a").await.unwrap(), Change::empty(0));
}
