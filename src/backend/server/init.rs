/**
 * Server Initialization
 *
 * This module builds the application state and starts its background
 * tasks.
 *
 * # Initialization Process
 *
 * 0. Validate the configuration
 * 1. Create the audit log and the broadcast channels
 * 2. Connect the document store (runs migrations, resolves the server id)
 * 3. Create the in-memory collaboration state and the rebase server
 * 4. Start the persistence worker
 * 5. Start periodic cleanup of broadcast channels without subscribers
 *
 * Document histories are not read eagerly. Each document is loaded from the
 * store the first time a session touches it.
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::backend::collab::{
    run_persistence_worker, CollabService, CollabState, PersistFailures, RebaseServer,
};
use crate::backend::error::BackendError;
use crate::backend::realtime::{AuditLog, ChangeBroadcastState};
use crate::backend::server::state::AppState;
use crate::backend::store::DocumentStore;
use crate::shared::AppConfig;

/// Create the application state
///
/// # Errors
///
/// Fails with `Config` when the configuration does not validate, or when
/// the store cannot be opened or migrated. Nothing is started in that case.
pub async fn create_app(config: AppConfig) -> Result<AppState, BackendError> {
    tracing::info!("[Server] Initializing xfcollab");
    config.validate()?;

    // Step 1: Audit log and broadcast channels
    let audit = AuditLog::new(config.broadcast_capacity);
    let broadcast = ChangeBroadcastState::new(config.broadcast_capacity);

    // Step 2: Persistent store
    let store = Arc::new(DocumentStore::connect(&config, audit.clone()).await?);

    // Step 3: In-memory state
    let server = RebaseServer::new(CollabState::new(), audit.clone());

    // Step 4: Persistence worker
    let (persist_tx, persist_rx) = mpsc::unbounded_channel();
    let failures = PersistFailures::new();
    let persistence = tokio::spawn(run_persistence_worker(
        store.clone(),
        persist_rx,
        failures.clone(),
        audit.clone(),
    ));
    let collab = CollabService::new(server, store.clone(), broadcast.clone(), persist_tx, failures);

    // Step 5: Periodic cleanup task for broadcast channels
    let cleanup_state = broadcast.clone();
    let period = Duration::from_secs(config.cleanup_interval_secs);
    let cleanup = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let removed = cleanup_state.cleanup_inactive_channels();
            tracing::debug!("[Realtime] Cleaned up {} inactive broadcast channels", removed);
        }
    });

    tracing::info!("[Server] Ready as server {}", store.server_id());

    Ok(AppState {
        config,
        collab,
        store,
        audit,
        broadcast,
        persistence,
        cleanup,
    })
}
