//! Persistence failure tests
//!
//! A change accepted in memory may still fail to reach the store. The
//! document must then be reloaded and its sessions told, instead of the
//! service accepting changes that will never be written.

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use xfcollab::backend::error::{BackendError, ErrorKind};
use xfcollab::backend::server::create_app;
use xfcollab::shared::AuditEvent;

use crate::common::{insert, single, TestDatabase};
use crate::{assert_document, assert_ok};

#[tokio::test]
async fn test_lost_append_race_forces_resync() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    let collab = &app.collab;
    collab.load_history("doc").await.unwrap();

    // Another process wins position 0 first
    let other = db.connect().await;
    other.load("doc").await.unwrap();
    other.on_new_change("doc", &single(0, insert(0, "other"))).await.unwrap();

    let mut audit = app.audit.subscribe();
    let first = assert_ok!(collab.submit_change("doc", 1, 0, single(0, insert(0, "a"))).await);
    assert_eq!(first.applied.start(), 0);
    collab.flush().await.unwrap();

    let failed = (0..8)
        .filter_map(|_| audit.try_recv().ok())
        .find_map(|record| match record.event {
            AuditEvent::PersistFailed { doc, start, length, .. } => Some((doc, start, length)),
            _ => None,
        });
    assert_eq!(failed, Some(("doc".to_string(), 0, 1)));

    let err = match collab.submit_change("doc", 1, 0, single(1, insert(1, "b"))).await {
        Err(e) => e,
        Ok(result) => panic!("submission on an unpersisted document accepted: {:?}", result),
    };
    assert_matches!(err, BackendError::Unpersisted { persisted_end: 1, .. });
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.requires_resync());

    // Memory now matches the store and accepts work again
    assert_document!(collab.load_history("doc").await.unwrap(), "other");
    let retry = assert_ok!(collab.submit_change("doc", 1, 0, single(1, insert(5, "!"))).await);
    assert_eq!(retry.applied, single(1, insert(5, "!")));

    let history = collab.load_history("doc").await.unwrap();
    app.shutdown().await.unwrap();

    let reopened = db.connect().await;
    assert_eq!(reopened.load("doc").await.unwrap(), history);
    assert_document!(history, "other!");
}

#[tokio::test]
async fn test_append_to_forgotten_document_forces_resync() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    let collab = &app.collab;
    collab.submit_change("doc", 1, 0, single(0, insert(0, "a"))).await.unwrap();
    collab.flush().await.unwrap();

    // The store forgets it loaded the document, so the next append fails
    // with DocumentNotLoaded inside the worker
    app.store.drop_database().await.unwrap();

    let mut audit = app.audit.subscribe();
    collab.submit_change("doc", 1, 0, single(1, insert(1, "b"))).await.unwrap();
    collab.flush().await.unwrap();

    let outcomes: Vec<AuditEvent> = std::iter::from_fn(|| audit.try_recv().ok())
        .map(|record| record.event)
        .filter(|event| matches!(event.kind(), "onNewChange" | "persistFailed"))
        .collect();
    assert_eq!(outcomes.len(), 1);
    assert_matches!(
        &outcomes[0],
        AuditEvent::PersistFailed { start: 1, length: 1, error, .. } if error.contains("not loaded")
    );

    let result = collab.submit_change("doc", 1, 0, single(2, insert(2, "c"))).await;
    assert_matches!(result, Err(BackendError::Unpersisted { persisted_end: 0, .. }));
    assert_eq!(collab.load_history("doc").await.unwrap().length(), 0);
    app.shutdown().await.unwrap();
}
