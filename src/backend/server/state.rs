/**
 * Application State Management
 *
 * `AppState` is the explicit owner of every process-wide structure: the
 * in-memory documents, the store and its expected-start cache, the
 * broadcast channels and the background tasks. It is built by
 * [`create_app`](crate::backend::server::init::create_app) and torn down by
 * [`AppState::shutdown`].
 *
 * # Thread Safety
 *
 * Everything reachable from `AppState` is `Send + Sync`:
 * - `CollabState` uses one `Mutex` per document behind an `RwLock`
 * - `DocumentStore` guards its cache with a `tokio::sync::Mutex`
 * - `broadcast::Sender` values are cloned freely
 *
 * # Example
 *
 * ```rust,no_run
 * use xfcollab::backend::server::init::create_app;
 * use xfcollab::shared::AppConfig;
 *
 * # async fn example() -> Result<(), Box<dyn std::error::Error>> {
 * let app = create_app(AppConfig::default()).await?;
 * let history = app.collab.load_history("notes").await?;
 * app.shutdown().await?;
 * # Ok(())
 * # }
 * ```
 */

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::collab::CollabService;
use crate::backend::error::BackendError;
use crate::backend::realtime::{AuditLog, ChangeBroadcastState};
use crate::backend::store::DocumentStore;
use crate::shared::AppConfig;

/// Application state
pub struct AppState {
    /// Configuration the state was built from
    pub config: AppConfig,

    /// Entry point for sessions
    pub collab: CollabService,

    /// Persistent store
    ///
    /// Shared with the persistence worker, which is the only writer while
    /// the application runs.
    pub store: Arc<DocumentStore>,

    /// Audit log shared by the rebase server and the store
    pub audit: AuditLog,

    /// Per-document channels of accepted changes
    pub broadcast: ChangeBroadcastState,

    pub(crate) persistence: JoinHandle<()>,
    pub(crate) cleanup: JoinHandle<()>,
}

impl AppState {
    /// Stop background work and close the store
    ///
    /// Changes already queued for persistence are written before the store
    /// is closed. Service clones kept by callers stop persisting afterwards.
    ///
    /// The worker is stopped and the store closed even when draining the
    /// queue fails; that error is returned afterwards.
    pub async fn shutdown(self) -> Result<(), BackendError> {
        tracing::info!("[Server] Shutting down");
        let Self {
            collab,
            store,
            persistence,
            cleanup,
            ..
        } = self;

        cleanup.abort();
        // Clones of the service may still hold senders, so drain then stop
        let drained = collab.flush().await;
        persistence.abort();

        store.on_close().await;
        match &drained {
            Ok(()) => tracing::info!("[Server] Shutdown complete"),
            Err(e) => tracing::error!("[Server] Shutdown lost queued changes: {}", e),
        }
        drained
    }
}
