//! Backend Error Module
//!
//! This module defines error types specific to the backend: the rebase
//! server, the collab service and the document store.
//!
//! # Architecture
//!
//! The error module is organized into focused submodules:
//!
//! - **`types`** - Error type definitions and constructors
//! - **`conversion`** - Error conversion implementations (lock poisoning, JSON reports)
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```
//!
//! # Error Types
//!
//! - `ProtocolViolation` - backtrack protocol broken by a client
//! - `UnmatchedStarts` - optimistic append lost a race
//! - `DocumentNotLoaded` - append before load on this store instance
//! - `Storage` / `Migration` - database errors
//! - `StateError` - poisoned lock or corrupt record
//! - `Shared` - change algebra misuse
//! - `SerializationError` - JSON serialization errors
//!
//! Nothing in the backend retries on its own. Callers inspect
//! [`BackendError::kind`] and [`BackendError::requires_resync`] to decide.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::{BackendError, ErrorKind};
