/**
 * Audit Event System
 *
 * This module defines the audit records the server and the store emit for
 * every operation. Records are plain serde values so they can be written to
 * logs as JSON and replayed by tooling.
 *
 * # Example
 *
 * ```rust
 * use xfcollab::shared::event::{AuditEvent, AuditRecord};
 *
 * let record = AuditRecord::new(AuditEvent::Loaded {
 *     doc: "notes".to_string(),
 *     start: 0,
 *     length: 3,
 * });
 * assert_eq!(record.event.kind(), "loaded");
 * ```
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::author::AuthorId;
use crate::shared::change::Change;

/// One auditable operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuditEvent {
    /// The store connected and resolved its server id
    Connected {
        #[serde(rename = "serverId")]
        server_id: Uuid,
    },
    /// A document record was loaded (or created empty)
    Loaded { doc: String, start: usize, length: usize },
    /// A change was appended to a persisted document
    OnNewChange {
        doc: String,
        start: usize,
        length: usize,
        /// History position just after the appended transactions
        end: usize,
    },
    /// All persisted documents were deleted
    DropDatabase {
        /// Number of document records removed
        documents: u64,
    },
    /// The store was closed
    OnClose,
    /// An author submitted a change
    ApplyChange {
        doc: String,
        #[serde(rename = "authorId")]
        author_id: AuthorId,
        incoming: Change,
        /// `None` when the submission failed
        applied: Option<Change>,
        backtrack: usize,
        rejections: usize,
    },
    /// An accepted change could not be persisted; the document must be
    /// reloaded before it accepts more changes
    PersistFailed {
        doc: String,
        start: usize,
        length: usize,
        error: String,
    },
}

impl AuditEvent {
    /// Short name of the event, as written in the `type` field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Loaded { .. } => "loaded",
            Self::OnNewChange { .. } => "onNewChange",
            Self::DropDatabase { .. } => "dropDatabase",
            Self::OnClose => "onClose",
            Self::ApplyChange { .. } => "applyChange",
            Self::PersistFailed { .. } => "persistFailed",
        }
    }

    /// Document this event concerns, if any
    pub fn doc(&self) -> Option<&str> {
        match self {
            Self::Loaded { doc, .. }
            | Self::OnNewChange { doc, .. }
            | Self::ApplyChange { doc, .. }
            | Self::PersistFailed { doc, .. } => Some(doc),
            _ => None,
        }
    }
}

/// Audit event stamped with the time it happened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRecord {
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// What happened
    #[serde(flatten)]
    pub event: AuditEvent,
}

impl AuditRecord {
    /// Stamp an event with the current time
    pub fn new(event: AuditEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}
