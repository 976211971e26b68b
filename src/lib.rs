//! xfcollab - Collaborative Editing Synchronization Core
//!
//! xfcollab is the server side of a real-time collaborative editor. Clients
//! edit optimistically and submit batches of transactions; the server
//! rebases each submission onto whatever other authors committed meanwhile,
//! rejects what conflicts, records the result as the canonical order and
//! persists it.
//!
//! # Module Structure
//!
//! - **`shared`** - The pure editing layer
//!   - Operations, transactions and the change algebra
//!   - The rebase function
//!   - Author bookkeeping, audit records, configuration
//!
//! - **`backend`** - The stateful layer
//!   - `RebaseServer` and the backtrack protocol
//!   - `DocumentStore` with optimistic appends on SQLite
//!   - Broadcasting, audit log, application state
//!
//! # Usage
//!
//! ```rust
//! use xfcollab::shared::operation::text_items;
//! use xfcollab::shared::{rebase, Change, Transaction};
//!
//! // Author 1 committed "Hello"; author 2 typed "!" without seeing it
//! let history = Change::from_transactions(0, vec![Transaction::insertion(0, text_items("Hello"))]);
//! let pending = Change::from_transactions(0, vec![Transaction::insertion(0, text_items("!"))]);
//!
//! let result = rebase(&history, &Change::empty(0), &pending).unwrap();
//! assert!(result.rejected.is_none());
//! let document = history.concat(&result.accepted).unwrap().apply_to(&[]).unwrap();
//! assert_eq!(document, text_items("Hello!"));
//! ```
//!
//! # Thread Safety
//!
//! - Document state: one `Mutex` per document behind an `RwLock` map
//! - Store: SQLite pool plus an async-locked cache of expected starts
//! - Broadcasting: `tokio::sync::broadcast` channels
//!
//! # Error Handling
//!
//! - `shared::error::SharedError` for misuse of the change algebra
//! - `backend::error::BackendError` for protocol, conflict, storage and
//!   invariant failures

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
