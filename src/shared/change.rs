/**
 * Change Algebra
 *
 * A `Change` is an ordered batch of transactions anchored at a position in a
 * document's commit history, together with one optional store snapshot per
 * transaction and the authors' selections after it.
 *
 * Changes are immutable values: every operation returns a new change. A
 * misaligned `concat` and an out-of-range `truncate` / `most_recent` fail
 * with an error instead of clamping, because they can only happen when the
 * caller's bookkeeping is wrong.
 *
 * # Example
 *
 * ```rust
 * use xfcollab::shared::change::Change;
 * use xfcollab::shared::operation::text_items;
 * use xfcollab::shared::transaction::Transaction;
 *
 * let first = Change::from_transactions(0, vec![Transaction::insertion(0, text_items("Hi"))]);
 * let second = Change::from_transactions(1, vec![Transaction::insertion(2, text_items("!"))]);
 * let both = first.concat(&second).unwrap();
 * assert_eq!(both.start(), 0);
 * assert_eq!(both.length(), 2);
 * ```
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::author::{AuthorId, Selection};
use crate::shared::error::SharedError;
use crate::shared::operation::Item;
use crate::shared::transaction::Transaction;

/// Opaque snapshot of extra values a transaction needs (for example new
/// annotation or element data referenced by hash)
pub type StoreSnapshot = serde_json::Value;

/// Ordered batch of transactions anchored at a history position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChangeRepr", into = "ChangeRepr")]
pub struct Change {
    start: usize,
    transactions: Vec<Transaction>,
    stores: Vec<Option<StoreSnapshot>>,
    selections: BTreeMap<AuthorId, Selection>,
}

#[derive(Serialize, Deserialize)]
struct ChangeRepr {
    start: usize,
    transactions: Vec<Transaction>,
    #[serde(default)]
    stores: Option<Vec<Option<StoreSnapshot>>>,
    #[serde(default)]
    selections: BTreeMap<AuthorId, Selection>,
}

impl TryFrom<ChangeRepr> for Change {
    type Error = SharedError;

    fn try_from(repr: ChangeRepr) -> Result<Self, Self::Error> {
        let stores = repr
            .stores
            .unwrap_or_else(|| vec![None; repr.transactions.len()]);
        Change::new(repr.start, repr.transactions, stores, repr.selections)
    }
}

impl From<Change> for ChangeRepr {
    fn from(change: Change) -> Self {
        Self {
            start: change.start,
            transactions: change.transactions,
            stores: Some(change.stores),
            selections: change.selections,
        }
    }
}

impl Change {
    /// Create a change
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransaction` when `stores` does not hold exactly one
    /// entry per transaction.
    pub fn new(
        start: usize,
        transactions: Vec<Transaction>,
        stores: Vec<Option<StoreSnapshot>>,
        selections: BTreeMap<AuthorId, Selection>,
    ) -> Result<Self, SharedError> {
        if stores.len() != transactions.len() {
            return Err(SharedError::invalid_transaction(format!(
                "{} stores for {} transactions",
                stores.len(),
                transactions.len()
            )));
        }
        Ok(Self {
            start,
            transactions,
            stores,
            selections,
        })
    }

    /// Zero-transaction change: the no-op marker at `start`
    pub fn empty(start: usize) -> Self {
        Self {
            start,
            transactions: Vec::new(),
            stores: Vec::new(),
            selections: BTreeMap::new(),
        }
    }

    /// Change whose transactions carry no store snapshots
    pub fn from_transactions(start: usize, transactions: Vec<Transaction>) -> Self {
        let stores = vec![None; transactions.len()];
        Self {
            start,
            transactions,
            stores,
            selections: BTreeMap::new(),
        }
    }

    /// Same change with the given selections
    pub fn with_selections(mut self, selections: BTreeMap<AuthorId, Selection>) -> Self {
        self.selections = selections;
        self
    }

    /// History position of the first transaction
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of transactions
    pub fn length(&self) -> usize {
        self.transactions.len()
    }

    /// Position just after the last transaction
    pub fn end(&self) -> usize {
        self.start + self.transactions.len()
    }

    /// True for the no-op marker
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn stores(&self) -> &[Option<StoreSnapshot>] {
        &self.stores
    }

    pub fn selections(&self) -> &BTreeMap<AuthorId, Selection> {
        &self.selections
    }

    /// First `n` transactions (`n >= 0`) or last `-n` transactions (`n < 0`)
    ///
    /// Selections are not carried over: they describe the state after the
    /// full change.
    pub fn truncate(&self, n: isize) -> Result<Self, SharedError> {
        let count = n.unsigned_abs();
        if count > self.length() {
            return Err(SharedError::out_of_range(format!(
                "cannot truncate {} transactions from a change of length {}",
                n,
                self.length()
            )));
        }
        let (from, to) = if n >= 0 {
            (0, count)
        } else {
            (self.length() - count, self.length())
        };
        Ok(self.slice(from, to, BTreeMap::new()))
    }

    /// Append `other`, which must start where this change ends
    pub fn concat(&self, other: &Change) -> Result<Self, SharedError> {
        if other.start != self.end() {
            return Err(SharedError::misaligned(self.end(), other.start));
        }
        let mut transactions = self.transactions.clone();
        transactions.extend(other.transactions.iter().cloned());
        let mut stores = self.stores.clone();
        stores.extend(other.stores.iter().cloned());
        let mut selections = self.selections.clone();
        selections.extend(other.selections.iter().map(|(k, v)| (*k, v.clone())));
        Ok(Self {
            start: self.start,
            transactions,
            stores,
            selections,
        })
    }

    /// Drop everything before history position `since`
    pub fn most_recent(&self, since: usize) -> Result<Self, SharedError> {
        if since < self.start || since > self.end() {
            return Err(SharedError::out_of_range(format!(
                "position {} outside change [{}, {}]",
                since,
                self.start,
                self.end()
            )));
        }
        Ok(self.slice(since - self.start, self.length(), self.selections.clone()))
    }

    /// Apply every transaction in order to a linear document
    pub fn apply_to(&self, document: &[Item]) -> Result<Vec<Item>, SharedError> {
        self.transactions
            .iter()
            .try_fold(document.to_vec(), |current, tx| tx.apply(&current))
    }

    fn slice(&self, from: usize, to: usize, selections: BTreeMap<AuthorId, Selection>) -> Self {
        Self {
            start: self.start + from,
            transactions: self.transactions[from..to].to_vec(),
            stores: self.stores[from..to].to_vec(),
            selections,
        }
    }
}
