/**
 * Rebase
 *
 * Transforms an author's pending change so it applies after history the
 * author has not seen yet. The server is the only ordering authority, so the
 * functions here are pure and deterministic: the same inputs always give the
 * same outputs, and clients may replay the server's decisions.
 *
 * # Transaction pairs
 *
 * Two transactions built on the same document are compared by their active
 * ranges (see [`Transaction::active_range`]):
 *
 * - committed entirely before incoming (`committed.end <= incoming.start`):
 *   incoming moves by committed's length delta. This also covers two
 *   insertions at the same point; the committed one stays first.
 * - incoming entirely before committed: committed moves by incoming's delta.
 * - overlapping: mergeable only when neither side replaces content and they
 *   touch no common attribute of the same element and no common annotation.
 *   Anything else is a conflict.
 *
 * # Rejection
 *
 * The first conflicting transaction and every transaction after it are
 * rejected together, untransformed. Later transactions may depend on the
 * rejected one, so they are never reordered around it.
 */

use std::collections::BTreeMap;

use crate::shared::change::Change;
use crate::shared::error::SharedError;
use crate::shared::transaction::Transaction;

/// Outcome of rebasing a pending change onto committed history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebaseResult {
    /// Transformed transactions to append to history, positioned at its end
    pub accepted: Change,
    /// Untransformed remainder starting at the first conflict
    pub rejected: Option<Change>,
    /// Baseline for the author's next submission
    ///
    /// Starts where the pending change started and holds the author's
    /// accepted transactions as the author has them, followed by the newly
    /// committed history transformed to apply after them.
    pub next_base: Change,
}

/// Transform a committed transaction and an incoming one against each other
///
/// Both must apply to the same document. Returns `(committed', incoming')`
/// such that `committed` then `incoming'` and `incoming` then `committed'`
/// reach the same document, or `None` when the two conflict.
pub fn rebase_transactions(
    committed: &Transaction,
    incoming: &Transaction,
) -> Result<Option<(Transaction, Transaction)>, SharedError> {
    let (Some(ours), Some(theirs)) = (committed.active_range(), incoming.active_range()) else {
        return Ok(Some((committed.clone(), incoming.clone())));
    };

    if ours.end <= theirs.start {
        Ok(Some((committed.clone(), incoming.shifted(ours.length_delta)?)))
    } else if theirs.end <= ours.start {
        Ok(Some((committed.shifted(theirs.length_delta)?, incoming.clone())))
    } else if mergeable(committed, incoming) {
        Ok(Some((committed.clone(), incoming.clone())))
    } else {
        Ok(None)
    }
}

fn mergeable(committed: &Transaction, incoming: &Transaction) -> bool {
    if !committed.is_metadata_only() || !incoming.is_metadata_only() {
        return false;
    }
    let ours = committed.metadata_touches();
    incoming
        .metadata_touches()
        .iter()
        .all(|touch| !ours.contains(touch))
}

/// Rebase `incoming` over every transaction in `committed`
///
/// Returns the committed transactions transformed to apply after `incoming`,
/// and `incoming` transformed to apply after all of them.
fn rebase_over(
    committed: &[Transaction],
    incoming: &Transaction,
) -> Result<Option<(Vec<Transaction>, Transaction)>, SharedError> {
    let mut transposed = Vec::with_capacity(committed.len());
    let mut current = incoming.clone();
    for tx in committed {
        match rebase_transactions(tx, &current)? {
            Some((tx, rebased)) => {
                transposed.push(tx);
                current = rebased;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((transposed, current)))
}

/// Rebase a pending change onto committed history
///
/// # Arguments
///
/// * `history` - The document's committed history
/// * `base` - What the author had when building `change`; the author's own
///   committed work at its front is dropped when `change` starts past it
/// * `change` - The pending change
///
/// # Errors
///
/// Returns a misalignment error when `change` does not start inside `base`,
/// or `base` reaches past the end of `history`.
pub fn rebase(history: &Change, base: &Change, change: &Change) -> Result<RebaseResult, SharedError> {
    if change.start() < base.start() || change.start() > base.end() {
        return Err(SharedError::misaligned(base.end(), change.start()));
    }
    if base.end() > history.end() {
        return Err(SharedError::out_of_range(format!(
            "base ends at {} past committed history end {}",
            base.end(),
            history.end()
        )));
    }

    let base = if change.start() > base.start() {
        base.most_recent(change.start())?
    } else {
        base.clone()
    };
    let base = base.concat(&history.most_recent(base.end())?)?;

    let mut committed = base.transactions().to_vec();
    let mut accepted = Vec::with_capacity(change.length());
    let mut rejected = None;
    for (i, incoming) in change.transactions().iter().enumerate() {
        match rebase_over(&committed, incoming)? {
            Some((transposed, rebased)) => {
                committed = transposed;
                accepted.push(rebased);
            }
            None => {
                rejected = Some(change.most_recent(change.start() + i)?);
                break;
            }
        }
    }

    let count = accepted.len();
    let selections = if rejected.is_none() {
        change.selections().clone()
    } else {
        BTreeMap::new()
    };
    let accepted = Change::new(base.end(), accepted, change.stores()[..count].to_vec(), selections)?;

    let mut own = change.transactions()[..count].to_vec();
    own.extend(committed);
    let mut stores = change.stores()[..count].to_vec();
    stores.extend(base.stores().iter().cloned());
    let next_base = Change::new(change.start(), own, stores, base.selections().clone())?;

    Ok(RebaseResult {
        accepted,
        rejected,
        next_base,
    })
}
