//! Collaborative Editing Module
//!
//! This module contains the server side of collaborative editing:
//! - In-memory document state (committed history, author bookkeeping)
//! - The rebase server, the single mutating entry point
//! - The async service that ties memory, storage and broadcasting together
//!
//! # Architecture
//!
//! The collab module is organized into focused submodules:
//!
//! - **`state`** - `CollabState` and `DocState`, one lock per document
//! - **`server`** - `RebaseServer::apply_change` and the backtrack protocol
//! - **`service`** - `CollabService` and the persistence worker
//!
//! # Example
//!
//! ```rust
//! use xfcollab::backend::collab::{CollabState, RebaseServer};
//! use xfcollab::backend::realtime::AuditLog;
//! use xfcollab::shared::operation::text_items;
//! use xfcollab::shared::{Change, Transaction};
//!
//! let server = RebaseServer::new(CollabState::new(), AuditLog::default());
//! let change = Change::from_transactions(0, vec![Transaction::insertion(0, text_items("Hello"))]);
//! let result = server.apply_change("doc-123", 1, 0, &change).unwrap();
//! assert_eq!(result.applied, change);
//! ```

/// In-memory document state
pub mod state;

/// Rebase server
pub mod server;

/// Async collaboration service
pub mod service;

/// Re-export commonly used types
pub use server::{ApplyResult, RebaseServer};
pub use service::{run_persistence_worker, CollabService, PersistFailures, PersistRequest};
pub use state::{CollabState, DocState};
