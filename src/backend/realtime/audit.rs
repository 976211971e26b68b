/**
 * Audit Log
 *
 * Every operation of the rebase server and the document store is recorded
 * twice: as a structured `tracing` event on target `xfcollab::audit`, and
 * on a broadcast channel for in-process consumers such as tests or replay
 * tools. Sending never blocks; consumers that lag lose records.
 */

use tokio::sync::broadcast;

use crate::shared::{AuditEvent, AuditRecord};

/// Default number of buffered audit records
pub const DEFAULT_AUDIT_CAPACITY: usize = 1024;

/// Sink for audit records
#[derive(Debug, Clone)]
pub struct AuditLog {
    tx: broadcast::Sender<AuditRecord>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Record an event
    ///
    /// # Returns
    ///
    /// Number of in-process subscribers that received the record
    pub fn log(&self, event: AuditEvent) -> usize {
        let record = AuditRecord::new(event);
        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(
                target: "xfcollab::audit",
                kind = record.event.kind(),
                doc = record.event.doc().unwrap_or_default(),
                "{}",
                json
            ),
            Err(e) => tracing::warn!(
                target: "xfcollab::audit",
                kind = record.event.kind(),
                "Failed to serialize audit record: {}",
                e
            ),
        }
        self.tx.send(record).unwrap_or(0)
    }

    /// Receive every record logged from now on
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.tx.subscribe()
    }
}
