//! Backtrack protocol tests through the collaboration service

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use xfcollab::backend::error::{BackendError, ErrorKind};
use xfcollab::backend::server::create_app;
use xfcollab::shared::{AuditEvent, Change};

use crate::common::{insert, remove, replace, single, TestDatabase};
use crate::{assert_document, assert_ok};

#[tokio::test]
async fn test_rejection_must_be_acknowledged() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    let collab = &app.collab;

    collab.submit_change("doc", 1, 0, single(0, insert(0, "Hello"))).await.unwrap();
    // Author 1 removes "Hello" before author 2's edit inside it arrives
    collab.submit_change("doc", 1, 0, single(1, remove(0, "Hello"))).await.unwrap();

    let conflicted = assert_ok!(collab.submit_change("doc", 2, 0, single(1, replace(0, "H", "J"))).await);
    assert!(conflicted.applied.is_empty());
    assert_eq!(conflicted.rejected, Some(single(1, replace(0, "H", "J"))));
    assert_eq!(conflicted.rejections, 1);

    // Not acknowledged: the new work is discarded and owed as well
    let discarded = assert_ok!(collab.submit_change("doc", 2, 0, single(2, insert(0, "x"))).await);
    assert_eq!(discarded.applied, Change::empty(2));
    assert_eq!(discarded.rejected, Some(single(2, insert(0, "x"))));
    assert_eq!(discarded.rejections, 2);

    // Acknowledging more than is owed breaks the protocol
    let err = match collab.submit_change("doc", 2, 3, Change::empty(2)).await {
        Err(e) => e,
        Ok(result) => panic!("expected a protocol violation, got {:?}", result),
    };
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_matches!(
        err,
        BackendError::ProtocolViolation { backtrack: 3, rejections: 2, .. }
    );

    let accepted = assert_ok!(collab.submit_change("doc", 2, 2, single(2, insert(0, "Bye"))).await);
    assert_eq!(accepted.applied, single(2, insert(0, "Bye")));
    assert_eq!(accepted.rejections, 0);

    let history = collab.load_history("doc").await.unwrap();
    assert_document!(history, "Bye");
    app.shutdown().await.unwrap();

    let store = db.connect().await;
    assert_document!(store.load("doc").await.unwrap(), "Bye");
}

#[tokio::test]
async fn test_misaligned_submission_is_rejected_whole() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    app.collab.submit_change("doc", 1, 0, single(0, insert(0, "a"))).await.unwrap();

    let result = app.collab.submit_change("doc", 2, 0, single(5, insert(0, "b"))).await;
    assert_matches!(result, Err(BackendError::Shared(e)) if e.is_misalignment());

    let history = app.collab.load_history("doc").await.unwrap();
    assert_eq!(history.length(), 1);
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_every_submission_is_audited() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();
    let mut audit = app.audit.subscribe();

    app.collab.submit_change("doc", 1, 0, single(0, insert(0, "a"))).await.unwrap();
    let _ = app.collab.submit_change("doc", 1, 4, Change::empty(1)).await;
    app.collab.flush().await.unwrap();

    let mut submissions = Vec::new();
    while let Ok(record) = audit.try_recv() {
        if let AuditEvent::ApplyChange { applied, backtrack, .. } = record.event {
            submissions.push((backtrack, applied.map(|c| c.length())));
        }
    }
    assert_eq!(submissions, vec![(0, Some(1)), (4, None)]);
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_concurrent_authors_are_serialized() {
    let db = TestDatabase::new();
    let app = create_app(db.config()).await.unwrap();

    // Every author types one letter at the start of the empty document
    let submissions = (1..=8u64).map(|author| {
        let collab = app.collab.clone();
        async move {
            let letter = ((b'a' + author as u8 - 1) as char).to_string();
            collab
                .submit_change("doc", author, 0, single(0, insert(0, &letter)))
                .await
        }
    });
    let results = futures_util::future::join_all(submissions).await;

    let mut starts: Vec<usize> = results
        .into_iter()
        .map(|result| {
            let result = result.unwrap();
            assert!(result.rejected.is_none());
            result.applied.start()
        })
        .collect();
    starts.sort_unstable();
    assert_eq!(starts, (0..8).collect::<Vec<_>>());

    let history = app.collab.load_history("doc").await.unwrap();
    let document = history.apply_to(&[]).unwrap();
    assert_eq!(document.len(), 8);
    app.shutdown().await.unwrap();

    let store = db.connect().await;
    assert_eq!(store.load("doc").await.unwrap(), history);
}
