/**
 * Change Broadcasting
 *
 * Accepted changes are pushed to subscribers of their document through
 * per-document `tokio::sync::broadcast` channels. Channels are created
 * lazily and swept periodically once nobody listens any more.
 *
 * # Broadcasting
 *
 * `tokio::sync::broadcast` is a multi-producer, multi-consumer channel; every
 * subscriber receives a copy of each event. A slow subscriber that falls
 * more than the channel capacity behind sees `RecvError::Lagged` and must
 * reload the document history.
 */

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::shared::{AuthorId, Change};

/// An accepted change, as seen by other collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Document name
    pub doc: String,
    /// Author whose submission produced the change
    pub author_id: AuthorId,
    /// Transactions appended to history
    pub change: Change,
}

/// Per-document broadcast channels
#[derive(Debug, Clone)]
pub struct ChangeBroadcastState {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<ChangeEvent>>>>,
    capacity: usize,
}

impl ChangeBroadcastState {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    // Channel bookkeeping stays usable after a panic elsewhere
    fn channels(&self) -> MutexGuard<'_, HashMap<String, broadcast::Sender<ChangeEvent>>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get or create the broadcast sender for a document
    pub fn get_sender(&self, doc: &str) -> broadcast::Sender<ChangeEvent> {
        let capacity = self.capacity;
        self.channels()
            .entry(doc.to_string())
            .or_insert_with(|| broadcast::channel(capacity).0)
            .clone()
    }

    /// Subscribe to accepted changes of a document
    pub fn subscribe(&self, doc: &str) -> broadcast::Receiver<ChangeEvent> {
        self.get_sender(doc).subscribe()
    }

    /// Broadcast an event to all subscribers of its document
    ///
    /// # Returns
    ///
    /// Number of subscribers that received the event (0 if none)
    pub fn broadcast(&self, event: ChangeEvent) -> usize {
        let Some(sender) = self.channels().get(&event.doc).cloned() else {
            tracing::debug!("[Realtime] No channel for document {}", event.doc);
            return 0;
        };
        let doc = event.doc.clone();
        match sender.send(event) {
            Ok(subscriber_count) => {
                tracing::debug!(
                    "[Realtime] Change on {} broadcast to {} subscribers",
                    doc,
                    subscriber_count
                );
                subscriber_count
            }
            Err(_) => {
                tracing::debug!("[Realtime] No subscribers for document {}", doc);
                0
            }
        }
    }

    /// Remove channels that have no subscribers left
    ///
    /// Returns the number of channels removed.
    pub fn cleanup_inactive_channels(&self) -> usize {
        let mut channels = self.channels();
        let before = channels.len();
        channels.retain(|_, sender| sender.receiver_count() > 0);
        before - channels.len()
    }

    /// Get subscriber count for a document
    pub fn get_subscriber_count(&self, doc: &str) -> usize {
        self.channels()
            .get(doc)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}
