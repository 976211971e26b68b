/**
 * Rebase Server
 *
 * The single mutating entry point of the collaboration core. Each
 * submission is interpreted against the author's bookkeeping, rebased onto
 * committed history and appended while the document's lock is held, so the
 * order in which submissions pass through here is the commit order.
 *
 * # Backtrack Protocol
 *
 * When a submission is partially rejected, the server remembers how many
 * transactions it rejected. The author's next submission says, through
 * `backtrack`, how many of those it has undone locally:
 *
 * - fewer than outstanding: the author has not caught up yet, so the new
 *   submission is rejected wholesale and added to the outstanding count
 * - more than outstanding: the client is out of sync, a protocol violation
 * - equal: the submission is rebased normally
 */

use crate::backend::collab::state::{CollabState, DocState};
use crate::backend::error::BackendError;
use crate::backend::realtime::AuditLog;
use crate::shared::rebase::rebase;
use crate::shared::{AuditEvent, AuthorDataChanges, AuthorId, Change};

/// Outcome of one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    /// Transactions appended to history, positioned where they landed
    ///
    /// Empty when nothing was accepted.
    pub applied: Change,
    /// Transactions the author must undo locally, untransformed
    pub rejected: Option<Change>,
    /// Rejections the author must acknowledge with its next `backtrack`
    pub rejections: usize,
}

/// Applies submissions to in-memory documents
#[derive(Debug, Clone)]
pub struct RebaseServer {
    state: CollabState,
    audit: AuditLog,
}

impl RebaseServer {
    pub fn new(state: CollabState, audit: AuditLog) -> Self {
        Self { state, audit }
    }

    /// In-memory document state
    pub fn state(&self) -> &CollabState {
        &self.state
    }

    /// Apply an author's submission to a document
    ///
    /// # Arguments
    ///
    /// * `doc` - Document name
    /// * `author_id` - Submitting author
    /// * `backtrack` - Rejected transactions the author has undone since its last submission
    /// * `change` - The submission, built on what the author has seen
    ///
    /// # Returns
    ///
    /// The accepted part (possibly empty) and any rejected remainder.
    ///
    /// # Errors
    ///
    /// - `ProtocolViolation` when `backtrack` exceeds the outstanding rejections
    /// - `Shared` when `change` does not line up with the author's baseline
    ///
    /// Every call emits exactly one `applyChange` audit record, including
    /// failed ones.
    pub fn apply_change(
        &self,
        doc: &str,
        author_id: AuthorId,
        backtrack: usize,
        change: &Change,
    ) -> Result<ApplyResult, BackendError> {
        let handle = match self.state.doc_handle(doc) {
            Ok(handle) => handle,
            Err(e) => {
                self.record(doc, author_id, backtrack, change, None, 0);
                return Err(e);
            }
        };
        let mut doc_state = match handle.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.record(doc, author_id, backtrack, change, None, 0);
                return Err(poisoned.into());
            }
        };

        let outcome = apply_to_doc(&mut doc_state, doc, author_id, backtrack, change);
        let rejections = doc_state.author(author_id).map_or(0, |author| author.rejections);
        match &outcome {
            Ok(result) => self.record(doc, author_id, backtrack, change, Some(result.applied.clone()), rejections),
            Err(e) => {
                tracing::warn!("[Collab] Submission by author {} on {} failed: {}", author_id, doc, e);
                self.record(doc, author_id, backtrack, change, None, rejections);
            }
        }
        outcome
    }

    fn record(
        &self,
        doc: &str,
        author_id: AuthorId,
        backtrack: usize,
        incoming: &Change,
        applied: Option<Change>,
        rejections: usize,
    ) {
        self.audit.log(AuditEvent::ApplyChange {
            doc: doc.to_string(),
            author_id,
            incoming: incoming.clone(),
            applied,
            backtrack,
            rejections,
        });
    }
}

fn apply_to_doc(
    doc_state: &mut DocState,
    doc: &str,
    author_id: AuthorId,
    backtrack: usize,
    change: &Change,
) -> Result<ApplyResult, BackendError> {
    let author = doc_state.author(author_id).cloned().unwrap_or_default();

    if author.rejections > backtrack {
        let outstanding = author.rejections - backtrack + change.length();
        doc_state.update(
            Some(author_id),
            None,
            Some(AuthorDataChanges::default().rejections(outstanding)),
        )?;
        tracing::info!(
            "[Collab] Author {} on {} still owes {} rejections, discarding {} transactions",
            author_id,
            doc,
            outstanding,
            change.length()
        );
        return Ok(ApplyResult {
            applied: Change::empty(doc_state.history.end()),
            rejected: (!change.is_empty()).then(|| change.clone()),
            rejections: outstanding,
        });
    }
    if author.rejections < backtrack {
        return Err(BackendError::protocol_violation(
            doc,
            author_id,
            backtrack,
            author.rejections,
        ));
    }

    let base = author
        .continue_base
        .unwrap_or_else(|| Change::empty(change.start()));
    let result = rebase(&doc_state.history, &base, change)?;
    let rejections = result.rejected.as_ref().map_or(0, Change::length);

    doc_state.update(
        Some(author_id),
        Some(&result.accepted),
        Some(
            AuthorDataChanges::default()
                .rejections(rejections)
                .continue_base(result.next_base),
        ),
    )?;

    tracing::debug!(
        "[Collab] Author {} on {}: accepted {} at {}, rejected {}",
        author_id,
        doc,
        result.accepted.length(),
        result.accepted.start(),
        rejections
    );

    Ok(ApplyResult {
        applied: result.accepted,
        rejected: result.rejected,
        rejections,
    })
}
