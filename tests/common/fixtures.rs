//! Builders for changes used across test suites

use xfcollab::shared::operation::text_items;
use xfcollab::shared::{Change, Transaction};

/// Insert `text` at `offset`
pub fn insert(offset: usize, text: &str) -> Transaction {
    Transaction::insertion(offset, text_items(text))
}

/// Remove `text`, which must sit at `offset`
pub fn remove(offset: usize, text: &str) -> Transaction {
    Transaction::removal(offset, text_items(text))
}

/// Replace `old` at `offset` with `new`
pub fn replace(offset: usize, old: &str, new: &str) -> Transaction {
    Transaction::builder()
        .retain(offset)
        .replace(text_items(old), text_items(new))
        .build()
}

/// A change of one transaction at history position `start`
pub fn single(start: usize, transaction: Transaction) -> Change {
    Change::from_transactions(start, vec![transaction])
}
