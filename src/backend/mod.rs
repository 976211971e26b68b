//! Backend Module
//!
//! This module contains the stateful half of xfcollab: the rebase server
//! that orders submissions, the store that persists committed history, and
//! the plumbing that connects them.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Application state, configuration, initialization
//! - **`collab`** - Document state, rebase server, collaboration service
//! - **`store`** - SQLite persistence with optimistic appends
//! - **`realtime`** - Change broadcasting and the audit log
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs      - Module exports and documentation
//! ├── main.rs     - xfcollab-inspect binary
//! ├── server/     - AppState, create_app, configuration
//! ├── collab/     - CollabState, RebaseServer, CollabService
//! ├── store/      - DocumentStore
//! ├── realtime/   - ChangeBroadcastState, AuditLog
//! └── error/      - BackendError
//! ```
//!
//! # Data Flow
//!
//! A submission `(doc, author, backtrack, change)` enters
//! `CollabService::submit_change`, which loads the document from the store
//! on first use and calls `RebaseServer::apply_change`. The accepted part is
//! appended to the in-memory history, returned to the caller, queued for
//! the persistence worker and broadcast to the document's subscribers.
//!
//! # Example
//!
//! ```rust,no_run
//! use xfcollab::backend::server::create_app;
//! use xfcollab::shared::operation::text_items;
//! use xfcollab::shared::{AppConfig, Change, Transaction};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(AppConfig::default()).await?;
//! let change = Change::from_transactions(0, vec![Transaction::insertion(0, text_items("Hello"))]);
//! let result = app.collab.submit_change("notes", 1, 0, change).await?;
//! println!("applied at {}", result.applied.start());
//! app.shutdown().await?;
//! # Ok(())
//! # }
//! ```

/// Server initialization and application state
pub mod server;

/// Collaborative editing core
pub mod collab;

/// Document persistence
pub mod store;

/// Change broadcasting and audit log
pub mod realtime;

/// Backend error types
pub mod error;

// Re-export commonly used types
pub use error::BackendError;
