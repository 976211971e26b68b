//! Four-step collaboration walkthrough
//!
//! Three authors edit "Doc1" starting from empty storage. The first two
//! steps are independent; the third author's edit collides with a removal
//! and has to be backtracked.

use pretty_assertions::assert_eq;
use xfcollab::backend::server::create_app;
use xfcollab::shared::Change;

use crate::common::{insert, remove, replace, single, TestDatabase};
use crate::{assert_document, assert_ok};

#[tokio::test]
async fn test_three_author_walkthrough() {
    let db = TestDatabase::new();

    // 1. Empty storage loads as an empty history
    let store = db.connect().await;
    assert_eq!(store.load("Doc1").await.unwrap(), Change::empty(0));
    store.on_close().await;

    let app = create_app(db.config()).await.unwrap();
    let collab = &app.collab;

    // 2. Author 1 inserts "Hello"
    let t1 = single(0, insert(0, "Hello"));
    let first = assert_ok!(collab.submit_change("Doc1", 1, 0, t1.clone()).await);
    assert_eq!(first.applied, t1);
    assert_eq!(first.rejected, None);

    // 3. Author 2 never saw T1 and inserts "World" at the same point
    let second = assert_ok!(collab.submit_change("Doc1", 2, 0, single(0, insert(0, "World"))).await);
    assert_eq!(second.applied, single(1, insert(5, "World")));
    assert_eq!(second.rejected, None);
    assert_document!(collab.load_history("Doc1").await.unwrap(), "HelloWorld");

    // 4. Author 1 removes "Hello" while author 3 edits inside it
    let removal = assert_ok!(collab.submit_change("Doc1", 1, 0, single(1, remove(0, "Hello"))).await);
    assert_eq!(removal.applied, single(2, remove(0, "Hello")));

    let edit = single(2, replace(1, "e", "a"));
    let third = assert_ok!(collab.submit_change("Doc1", 3, 0, edit.clone()).await);
    assert!(third.applied.is_empty());
    assert_eq!(third.rejected, Some(edit));

    // Author 3 undoes the rejected edit and resubmits on top of the removal
    let backtrack = third.rejected.as_ref().map_or(0, Change::length);
    let retry = assert_ok!(collab.submit_change("Doc1", 3, backtrack, single(3, insert(5, "!"))).await);
    assert_eq!(retry.applied, single(3, insert(5, "!")));
    assert_eq!(retry.rejections, 0);

    let history = collab.load_history("Doc1").await.unwrap();
    assert_eq!(history.length(), 4);
    assert_document!(history, "World!");
    app.shutdown().await.unwrap();

    let store = db.connect().await;
    assert_eq!(store.load("Doc1").await.unwrap(), history);
}
