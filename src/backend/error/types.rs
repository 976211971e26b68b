/**
 * Backend Error Types
 *
 * This module defines the errors raised by the rebase server, the collab
 * service and the document store.
 *
 * # Error Categories
 *
 * ## Protocol
 *
 * The client broke the backtrack protocol and must resynchronize:
 * - `ProtocolViolation` - backtrack larger than the outstanding rejections
 *
 * ## Conflict
 *
 * Optimistic concurrency detected a stale write:
 * - `UnmatchedStarts` - an append did not start at the persisted end
 * - `Unpersisted` - accepted changes never reached the store and were
 *   discarded when the document was reloaded
 *
 * ## Storage
 *
 * Database failures propagated unmodified:
 * - `Storage` - `sqlx` errors
 * - `Migration` - embedded migration failures
 *
 * ## Invariant
 *
 * Bookkeeping bugs that should never happen in a correct deployment:
 * - `DocumentNotLoaded`, `StateError`, `Shared`, `SerializationError`
 * - `Config` - configuration rejected at startup
 */

use thiserror::Error;

use crate::shared::{AuthorId, ConfigError, SharedError};

/// Coarse classification of a backend error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client broke the submission protocol
    Protocol,
    /// Concurrent writer won an optimistic race
    Conflict,
    /// Database unavailable or failing
    Storage,
    /// Internal bookkeeping is inconsistent
    Invariant,
}

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use xfcollab::backend::error::{BackendError, ErrorKind};
///
/// let err = BackendError::unmatched_starts("notes", 4, 3);
/// assert_eq!(err.kind(), ErrorKind::Conflict);
/// assert!(err.requires_resync());
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// An author acknowledged more rejections than were outstanding
    #[error("Protocol violation on {doc}: author {author_id} backtracked {backtrack} with {rejections} rejections outstanding")]
    ProtocolViolation {
        /// Document name
        doc: String,
        /// Submitting author
        author_id: AuthorId,
        /// Backtrack the author sent
        backtrack: usize,
        /// Rejections the server was holding
        rejections: usize,
    },

    /// A persisted append did not start where the stored history ends
    #[error("Unmatched starts on {doc}: expected {expected}, found {found}")]
    UnmatchedStarts {
        /// Document name
        doc: String,
        /// Start the store expected
        expected: usize,
        /// Start the change carried
        found: usize,
    },

    /// Accepted changes could not be persisted
    ///
    /// The document was reloaded from the store, so every session must
    /// resynchronize before submitting again.
    #[error("Changes to {doc} were not persisted; document reloaded at {persisted_end}")]
    Unpersisted {
        /// Document name
        doc: String,
        /// End of the history that survived in the store
        persisted_end: usize,
    },

    /// An append referenced a document this store instance never loaded
    #[error("Document {doc} was not loaded before appending")]
    DocumentNotLoaded {
        /// Document name
        doc: String,
    },

    /// Database error
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// State management error (poisoned lock, corrupt record)
    #[error("State error: {message}")]
    StateError {
        /// Human-readable error message
        message: String,
    },

    /// Error from the change algebra or rebase function
    #[error(transparent)]
    Shared(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl BackendError {
    /// Create a new protocol violation
    pub fn protocol_violation(
        doc: impl Into<String>,
        author_id: AuthorId,
        backtrack: usize,
        rejections: usize,
    ) -> Self {
        Self::ProtocolViolation {
            doc: doc.into(),
            author_id,
            backtrack,
            rejections,
        }
    }

    /// Create a new optimistic concurrency conflict
    pub fn unmatched_starts(doc: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::UnmatchedStarts {
            doc: doc.into(),
            expected,
            found,
        }
    }

    pub fn unpersisted(doc: impl Into<String>, persisted_end: usize) -> Self {
        Self::Unpersisted {
            doc: doc.into(),
            persisted_end,
        }
    }

    pub fn not_loaded(doc: impl Into<String>) -> Self {
        Self::DocumentNotLoaded { doc: doc.into() }
    }

    /// Create a new state error
    ///
    /// # Example
    ///
    /// ```rust
    /// use xfcollab::backend::error::BackendError;
    ///
    /// let err = BackendError::state("Failed to acquire lock");
    /// ```
    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Classify the error
    ///
    /// # Kind Mapping
    ///
    /// - `ProtocolViolation` - Protocol
    /// - `UnmatchedStarts` / `Unpersisted` - Conflict
    /// - `Storage` / `Migration` - Storage
    /// - everything else - Invariant
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProtocolViolation { .. } => ErrorKind::Protocol,
            Self::UnmatchedStarts { .. } | Self::Unpersisted { .. } => ErrorKind::Conflict,
            Self::Storage(_) | Self::Migration(_) => ErrorKind::Storage,
            Self::DocumentNotLoaded { .. }
            | Self::StateError { .. }
            | Self::Shared(_)
            | Self::SerializationError(_)
            | Self::Config(_) => ErrorKind::Invariant,
        }
    }

    /// Whether the client or caller must reload state before continuing
    pub fn requires_resync(&self) -> bool {
        matches!(self.kind(), ErrorKind::Protocol | ErrorKind::Conflict)
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::StateError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}
