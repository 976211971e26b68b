//! Real-time Update Module
//!
//! This module fans out what the server does to in-process listeners.
//!
//! # Architecture
//!
//! - **`broadcast`** - per-document channels carrying accepted changes
//! - **`audit`** - the audit log, mirrored to `tracing` and a broadcast channel
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── broadcast.rs - Change broadcasting per document
//! └── audit.rs     - Audit record sink
//! ```
//!
//! # Example
//!
//! ```rust
//! use xfcollab::backend::realtime::{ChangeBroadcastState, ChangeEvent};
//! use xfcollab::shared::Change;
//!
//! let channels = ChangeBroadcastState::new(16);
//! let mut rx = channels.subscribe("notes");
//! let delivered = channels.broadcast(ChangeEvent {
//!     doc: "notes".to_string(),
//!     author_id: 1,
//!     change: Change::empty(0),
//! });
//! assert_eq!(delivered, 1);
//! assert!(rx.try_recv().is_ok());
//! ```

/// Change broadcasting
pub mod broadcast;

/// Audit record sink
pub mod audit;

// Re-export commonly used types
pub use audit::AuditLog;
pub use broadcast::{ChangeBroadcastState, ChangeEvent};
