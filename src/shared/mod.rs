//! Shared Module
//!
//! This module contains the pure editing layer: the data model for edits,
//! the change algebra, the rebase function, per-author bookkeeping, audit
//! records and configuration. Nothing in here performs I/O except reading a
//! configuration file, so every type can be used by both server and tooling.
//!
//! # Overview
//!
//! - **`operation`** / **`transaction`** - edit primitives over linear data
//! - **`change`** - batches of transactions anchored in commit history
//! - **`rebase`** - transforming pending changes over unseen history
//! - **`author`** - per-author state needed to interpret submissions

/// Edit primitives
pub mod operation;

/// Atomic lists of operations
pub mod transaction;

/// Change algebra
pub mod change;

/// Rebase of pending changes onto committed history
pub mod rebase;

/// Per-author bookkeeping
pub mod author;

/// Audit records
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use author::{AuthorDataChanges, AuthorId, AuthorState};
pub use change::Change;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{AuditEvent, AuditRecord};
pub use operation::{Item, Operation};
pub use rebase::{rebase, RebaseResult};
pub use transaction::Transaction;
