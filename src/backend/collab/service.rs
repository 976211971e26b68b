/**
 * Collaboration Service
 *
 * Async façade over the rebase server for session layers. It makes sure a
 * document's persisted history is loaded into memory before the first
 * submission, hands accepted changes to the persistence worker in commit
 * order, and fans them out to subscribers.
 *
 * # Ordering
 *
 * Each document has an async gate. Loading, applying and enqueueing for one
 * document all happen under its gate, so the persistence queue sees a
 * document's changes in exactly the order they were committed in memory.
 * The caller gets its result without waiting for the write to land.
 *
 * # Persistence failures
 *
 * When an append fails the worker marks the document and skips its later
 * appends. The next gated call on the document drops the in-memory state,
 * reloads what the store holds and fails once with `Unpersisted`, so
 * sessions learn that their recent changes were lost and resynchronize.
 *
 * Gates are removed by `clear_document` when no other call is waiting on
 * them; otherwise they live as long as the service.
 */

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

use crate::backend::collab::server::{ApplyResult, RebaseServer};
use crate::backend::error::BackendError;
use crate::backend::realtime::{AuditLog, ChangeBroadcastState, ChangeEvent};
use crate::backend::store::DocumentStore;
use crate::shared::{AuditEvent, AuthorDataChanges, AuthorId, Change};

/// Work item for the persistence worker
#[derive(Debug)]
pub enum PersistRequest {
    /// Append an accepted change
    Append { doc: String, change: Change },
    /// Reply once everything queued before this request was handled
    Flush(oneshot::Sender<()>),
}

/// Per-document gate; `true` once the store history is in memory
type LoadGate = Arc<Mutex<bool>>;

/// Documents whose accepted changes did not reach the store
///
/// Shared by the service and the persistence worker.
#[derive(Debug, Clone, Default)]
pub struct PersistFailures {
    docs: Arc<StdMutex<HashSet<String>>>,
}

impl PersistFailures {
    pub fn new() -> Self {
        Self::default()
    }

    fn docs(&self) -> MutexGuard<'_, HashSet<String>> {
        self.docs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark a document; returns `false` if it was already marked
    pub fn mark(&self, doc: &str) -> bool {
        self.docs().insert(doc.to_string())
    }

    pub fn contains(&self, doc: &str) -> bool {
        self.docs().contains(doc)
    }

    fn clear(&self, doc: &str) -> bool {
        self.docs().remove(doc)
    }
}

/// Async entry point for sessions
#[derive(Debug, Clone)]
pub struct CollabService {
    server: RebaseServer,
    store: Arc<DocumentStore>,
    broadcast: ChangeBroadcastState,
    persist_tx: mpsc::UnboundedSender<PersistRequest>,
    failures: PersistFailures,
    gates: Arc<StdMutex<HashMap<String, LoadGate>>>,
}

impl CollabService {
    pub fn new(
        server: RebaseServer,
        store: Arc<DocumentStore>,
        broadcast: ChangeBroadcastState,
        persist_tx: mpsc::UnboundedSender<PersistRequest>,
        failures: PersistFailures,
    ) -> Self {
        Self {
            server,
            store,
            broadcast,
            persist_tx,
            failures,
            gates: Arc::new(StdMutex::new(HashMap::new())),
        }
    }

    /// The underlying rebase server
    pub fn server(&self) -> &RebaseServer {
        &self.server
    }

    fn gate(&self, doc: &str) -> Result<LoadGate, BackendError> {
        let mut gates = self.gates.lock()?;
        Ok(gates
            .entry(doc.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(false)))
            .clone())
    }

    /// Drop the gate of `doc` unless another call holds or waits on it
    fn release_gate(&self, doc: &str) -> Result<bool, BackendError> {
        let mut gates = self.gates.lock()?;
        let idle = gates.get(doc).is_some_and(|gate| Arc::strong_count(gate) == 1);
        if idle {
            gates.remove(doc);
        }
        Ok(idle)
    }

    async fn ensure_loaded(&self, doc: &str, loaded: &mut bool) -> Result<(), BackendError> {
        if self.failures.contains(doc) {
            return self.resync(doc, loaded).await;
        }
        if *loaded {
            return Ok(());
        }
        let history = self.store.load(doc).await?;
        self.server.state().restore_history(doc, history)?;
        *loaded = true;
        Ok(())
    }

    /// Replace the in-memory state of a document whose appends failed with
    /// what the store holds
    ///
    /// Always ends in an error: `Unpersisted` once the reload succeeded,
    /// otherwise the reload error, in which case the next call tries again.
    async fn resync(&self, doc: &str, loaded: &mut bool) -> Result<(), BackendError> {
        // The worker skips the document's queued appends while it is marked
        self.flush().await?;
        self.server.state().clear_doc_state(doc)?;
        *loaded = false;

        let history = self.store.load(doc).await?;
        let persisted_end = history.end();
        self.server.state().restore_history(doc, history)?;
        *loaded = true;
        self.failures.clear(doc);

        tracing::warn!(
            "[Collab] Reloaded {} from the store at {}, unpersisted changes discarded",
            doc,
            persisted_end
        );
        Err(BackendError::unpersisted(doc, persisted_end))
    }

    /// Submit an author's change
    ///
    /// # Arguments
    ///
    /// * `doc` - Document name
    /// * `author_id` - Submitting author
    /// * `backtrack` - Rejected transactions the author has undone
    /// * `change` - The submission
    ///
    /// # Returns
    ///
    /// The result of [`RebaseServer::apply_change`]. A non-empty applied
    /// change has been queued for persistence and broadcast to subscribers.
    ///
    /// # Errors
    ///
    /// Besides the rebase server's errors, `Unpersisted` when an earlier
    /// change on the document failed to persist. The submission is not
    /// applied; the document now holds the persisted history only.
    pub async fn submit_change(
        &self,
        doc: &str,
        author_id: AuthorId,
        backtrack: usize,
        change: Change,
    ) -> Result<ApplyResult, BackendError> {
        let gate = self.gate(doc)?;
        let mut loaded = gate.lock().await;
        self.ensure_loaded(doc, &mut loaded).await?;

        let result = self.server.apply_change(doc, author_id, backtrack, &change)?;
        if !result.applied.is_empty() {
            let request = PersistRequest::Append {
                doc: doc.to_string(),
                change: result.applied.clone(),
            };
            if self.persist_tx.send(request).is_err() {
                tracing::error!(
                    "[Collab] Persistence worker stopped, change at {} on {} is memory only",
                    result.applied.start(),
                    doc
                );
            }
            self.broadcast.broadcast(ChangeEvent {
                doc: doc.to_string(),
                author_id,
                change: result.applied.clone(),
            });
        }
        Ok(result)
    }

    /// Committed history of a document, loading it from the store if needed
    pub async fn load_history(&self, doc: &str) -> Result<Change, BackendError> {
        let gate = self.gate(doc)?;
        let mut loaded = gate.lock().await;
        self.ensure_loaded(doc, &mut loaded).await?;
        Ok(self.server.state().get_doc_state(doc)?.history)
    }

    /// Receive every change accepted on a document from now on
    pub fn subscribe(&self, doc: &str) -> broadcast::Receiver<ChangeEvent> {
        self.broadcast.subscribe(doc)
    }

    /// Update an author's presentation data
    ///
    /// Only name, color and selection are taken from `changes`; rejection
    /// counts and baselines stay owned by the rebase server.
    pub async fn update_author(
        &self,
        doc: &str,
        author_id: AuthorId,
        changes: AuthorDataChanges,
    ) -> Result<(), BackendError> {
        let gate = self.gate(doc)?;
        let _loaded = gate.lock().await;
        let presentation = AuthorDataChanges {
            continue_base: None,
            rejections: None,
            ..changes
        };
        self.server
            .state()
            .update_doc_state(doc, Some(author_id), None, Some(presentation))
    }

    /// Forget an author whose session ended
    pub async fn remove_author(&self, doc: &str, author_id: AuthorId) -> Result<bool, BackendError> {
        let gate = self.gate(doc)?;
        let _loaded = gate.lock().await;
        let removed = self.server.state().remove_author(doc, author_id)?;
        if removed {
            tracing::info!("[Collab] Removed author {} from {}", author_id, doc);
        }
        Ok(removed)
    }

    /// Drop a document's in-memory state; the next use reloads it from the store
    ///
    /// Changes still queued for persistence are written first.
    pub async fn clear_document(&self, doc: &str) -> Result<(), BackendError> {
        let gate = self.gate(doc)?;
        {
            let mut loaded = gate.lock().await;
            self.flush().await?;
            self.server.state().clear_doc_state(doc)?;
            *loaded = false;
        }
        drop(gate);
        self.release_gate(doc)?;
        Ok(())
    }

    /// Wait until every change queued so far has been handled by the persistence worker
    pub async fn flush(&self) -> Result<(), BackendError> {
        let (tx, rx) = oneshot::channel();
        self.persist_tx
            .send(PersistRequest::Flush(tx))
            .map_err(|_| BackendError::state("persistence worker stopped"))?;
        rx.await
            .map_err(|_| BackendError::state("persistence worker stopped before flushing"))
    }
}

/// Drain persistence requests in order until every sender is gone
///
/// A failed append marks its document in `failures` and is reported as a
/// `persistFailed` audit record. Later appends to a marked document are
/// skipped until the service reloads it; nothing is retried.
pub async fn run_persistence_worker(
    store: Arc<DocumentStore>,
    mut requests: mpsc::UnboundedReceiver<PersistRequest>,
    failures: PersistFailures,
    audit: AuditLog,
) {
    tracing::info!("[Store] Persistence worker started");
    while let Some(request) = requests.recv().await {
        match request {
            PersistRequest::Append { doc, change } => {
                if failures.contains(&doc) {
                    tracing::warn!(
                        "[Store] Skipping {} transactions on {} at {} until it is reloaded",
                        change.length(),
                        doc,
                        change.start()
                    );
                    continue;
                }
                if let Err(e) = store.on_new_change(&doc, &change).await {
                    tracing::error!(
                        "[Store] Failed to persist {} transactions on {} at {}: {}",
                        change.length(),
                        doc,
                        change.start(),
                        e
                    );
                    failures.mark(&doc);
                    audit.log(AuditEvent::PersistFailed {
                        doc,
                        start: change.start(),
                        length: change.length(),
                        error: e.to_string(),
                    });
                }
            }
            PersistRequest::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    tracing::info!("[Store] Persistence worker stopped");
}
