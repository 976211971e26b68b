//! Database test fixtures and utilities
//!
//! Every fixture owns a fresh SQLite file in a temporary directory, so tests
//! can run in parallel and see persistence across reconnects.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use xfcollab::backend::realtime::AuditLog;
use xfcollab::backend::store::DocumentStore;
use xfcollab::shared::AppConfig;

/// Configuration pointing at `path`
pub fn file_config(path: &std::path::Path) -> AppConfig {
    AppConfig::builder()
        .database_url(format!("sqlite://{}", path.display()))
        .max_connections(2)
        .build()
        .expect("Failed to build test config")
}

/// Test database fixture
///
/// The directory and the database file are removed when the fixture drops.
pub struct TestDatabase {
    dir: TempDir,
}

impl TestDatabase {
    /// Create an empty temporary directory for the database
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    /// Path of the database file
    pub fn path(&self) -> PathBuf {
        self.dir.path().join("documents.db")
    }

    /// Configuration for this database
    pub fn config(&self) -> AppConfig {
        file_config(&self.path())
    }

    /// Open a new store instance on this database
    pub async fn connect(&self) -> Arc<DocumentStore> {
        self.connect_with(AuditLog::default()).await
    }

    /// Open a new store instance reporting to `audit`
    pub async fn connect_with(&self, audit: AuditLog) -> Arc<DocumentStore> {
        Arc::new(
            DocumentStore::connect(&self.config(), audit)
                .await
                .expect("Failed to connect test store"),
        )
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}
