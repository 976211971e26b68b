//! Application lifecycle and broadcast tests

use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use tokio::time::timeout;
use xfcollab::backend::error::BackendError;
use xfcollab::backend::server::create_app;
use xfcollab::shared::AuditEvent;

use crate::common::{insert, single, TestDatabase};
use crate::{assert_contains, assert_document};

#[tokio::test]
async fn test_accepted_changes_reach_subscribers() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    let mut notes = app.collab.subscribe("notes");
    let mut other = app.collab.subscribe("other");
    assert_eq!(app.broadcast.get_subscriber_count("notes"), 1);

    app.collab.submit_change("notes", 7, 0, single(0, insert(0, "hi"))).await.unwrap();

    let event = timeout(Duration::from_secs(1), notes.recv())
        .await
        .expect("Timed out waiting for broadcast")
        .unwrap();
    assert_eq!(event.doc, "notes");
    assert_eq!(event.author_id, 7);
    assert_eq!(event.change, single(0, insert(0, "hi")));
    assert!(other.try_recv().is_err());

    drop(notes);
    drop(other);
    assert_eq!(app.broadcast.cleanup_inactive_channels(), 2);
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_persists_queued_changes() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    let server_id = app.store.server_id();
    let mut audit = app.audit.subscribe();

    for (i, word) in ["a", "b", "c"].iter().enumerate() {
        app.collab
            .submit_change("doc", 1, 0, single(i, insert(i, word)))
            .await
            .unwrap();
    }
    app.shutdown().await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(record) = audit.try_recv() {
        kinds.push(record.event.kind());
    }
    assert_eq!(kinds.iter().filter(|k| **k == "onNewChange").count(), 3);
    assert_eq!(kinds.last(), Some(&"onClose"));

    let store = db.connect().await;
    assert_eq!(store.server_id(), server_id);
    assert_document!(store.load("doc").await.unwrap(), "abc");
}

#[tokio::test]
async fn test_history_is_seeded_from_store() {
    let db = TestDatabase::new();
    let store = db.connect().await;
    store.load("doc").await.unwrap();
    store.on_new_change("doc", &single(0, insert(0, "seed"))).await.unwrap();
    store.on_close().await;

    let app = create_app(db.config()).await.unwrap();
    let mut audit = app.audit.subscribe();
    let result = app
        .collab
        .submit_change("doc", 2, 0, single(1, insert(4, "ed")))
        .await
        .unwrap();
    assert_eq!(result.applied.start(), 1);

    let loaded = audit.recv().await.unwrap();
    assert_eq!(
        loaded.event,
        AuditEvent::Loaded {
            doc: "doc".to_string(),
            start: 0,
            length: 1
        }
    );
    let json = serde_json::to_string(&loaded).unwrap();
    assert_contains!(json, "\"type\":\"loaded\"");

    assert_document!(app.collab.load_history("doc").await.unwrap(), "seeded");
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_config_is_refused() {
    let db = TestDatabase::new();

    let mut config = db.config();
    config.cleanup_interval_secs = 0;
    let err = create_app(config).await.err().expect("zero cleanup interval accepted");
    assert_matches!(err, BackendError::Config(_));

    let mut config = db.config();
    config.broadcast_capacity = 0;
    let err = create_app(config).await.err().expect("zero broadcast capacity accepted");
    assert_matches!(err, BackendError::Config(_));
}
