/**
 * Collaborative Editing State Management
 *
 * This module holds the server's in-memory view of every open document:
 * the committed history and the bookkeeping for each author.
 *
 * # Locking
 *
 * The outer map is behind an `RwLock` and only held long enough to find or
 * insert a document. Each document sits behind its own `Mutex`, so
 * submissions to different documents never wait on each other, while
 * everything touching one document runs one at a time. The rebase math is
 * synchronous, so std locks are used and never held across an await.
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use crate::backend::error::BackendError;
use crate::shared::{AuthorDataChanges, AuthorId, AuthorState, Change, SharedError};

/// Per-document state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocState {
    /// Every committed transaction, from position 0 unless compacted
    pub history: Change,
    /// Bookkeeping per author
    pub authors: BTreeMap<AuthorId, AuthorState>,
}

impl Default for DocState {
    fn default() -> Self {
        Self::with_history(Change::empty(0))
    }
}

impl DocState {
    /// Create a document state seeded with committed history
    pub fn with_history(history: Change) -> Self {
        Self {
            history,
            authors: BTreeMap::new(),
        }
    }

    /// State of one author, if they ever submitted or were registered
    pub fn author(&self, author_id: AuthorId) -> Option<&AuthorState> {
        self.authors.get(&author_id)
    }

    /// Append history and merge author changes
    ///
    /// The history append is checked first; on misalignment nothing is
    /// modified. With `author_id` set the author is created if unknown.
    pub fn update(
        &mut self,
        author_id: Option<AuthorId>,
        new_history: Option<&Change>,
        changes: Option<AuthorDataChanges>,
    ) -> Result<(), SharedError> {
        if let Some(appended) = new_history {
            self.history = self.history.concat(appended)?;
        }
        if let Some(author_id) = author_id {
            let author = self.authors.entry(author_id).or_default();
            if let Some(changes) = changes {
                author.apply(changes);
            }
        }
        Ok(())
    }
}

/// Handle to one document's lockable state
pub type DocHandle = Arc<Mutex<DocState>>;

/// Collaborative editing state managed by the server
#[derive(Debug, Clone, Default)]
pub struct CollabState {
    /// Map of document name to document state
    documents: Arc<RwLock<HashMap<String, DocHandle>>>,
}

impl CollabState {
    /// Create a new empty collaborative state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the lockable state of a document
    pub fn doc_handle(&self, doc: &str) -> Result<DocHandle, BackendError> {
        if let Some(handle) = self.documents.read()?.get(doc) {
            return Ok(handle.clone());
        }
        let mut documents = self.documents.write()?;
        let handle = documents
            .entry(doc.to_string())
            .or_insert_with(|| {
                tracing::debug!("[Collab] Created state for document {}", doc);
                Arc::new(Mutex::new(DocState::default()))
            })
            .clone();
        Ok(handle)
    }

    /// Snapshot of a document's state, creating it if needed
    pub fn get_doc_state(&self, doc: &str) -> Result<DocState, BackendError> {
        let handle = self.doc_handle(doc)?;
        let state = handle.lock()?;
        Ok(state.clone())
    }

    /// Append committed history and merge author changes for a document
    ///
    /// # Arguments
    ///
    /// * `doc` - Document name
    /// * `author_id` - Author to create or update, if any
    /// * `new_history` - Change to append; must start at the current history end
    /// * `changes` - Partial author update
    pub fn update_doc_state(
        &self,
        doc: &str,
        author_id: Option<AuthorId>,
        new_history: Option<&Change>,
        changes: Option<AuthorDataChanges>,
    ) -> Result<(), BackendError> {
        let handle = self.doc_handle(doc)?;
        let mut state = handle.lock()?;
        state.update(author_id, new_history, changes)?;
        Ok(())
    }

    /// Drop all in-memory state for a document
    ///
    /// Returns whether the document was present.
    pub fn clear_doc_state(&self, doc: &str) -> Result<bool, BackendError> {
        let removed = self.documents.write()?.remove(doc).is_some();
        if removed {
            tracing::info!("[Collab] Cleared state for document {}", doc);
        }
        Ok(removed)
    }

    /// Seed a document with history loaded from the store
    ///
    /// Only valid while the document has no committed history of its own.
    pub fn restore_history(&self, doc: &str, history: Change) -> Result<(), BackendError> {
        let handle = self.doc_handle(doc)?;
        let mut state = handle.lock()?;
        if !state.history.is_empty() {
            return Err(BackendError::state(format!(
                "cannot restore {}: {} transactions already in memory",
                doc,
                state.history.length()
            )));
        }
        tracing::info!(
            "[Collab] Restored {} transactions for document {}",
            history.length(),
            doc
        );
        state.history = history;
        Ok(())
    }

    /// Forget an author's bookkeeping
    pub fn remove_author(&self, doc: &str, author_id: AuthorId) -> Result<bool, BackendError> {
        let handle = self.doc_handle(doc)?;
        let mut state = handle.lock()?;
        Ok(state.authors.remove(&author_id).is_some())
    }

    /// Names of all documents held in memory, sorted
    pub fn document_names(&self) -> Result<Vec<String>, BackendError> {
        let mut names: Vec<String> = self.documents.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
