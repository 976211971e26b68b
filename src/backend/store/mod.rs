//! Document Store Module
//!
//! Durable storage of committed document histories in SQLite.
//!
//! # Architecture
//!
//! - **`db`** - `DocumentStore`: connection, load, optimistic append, lifecycle
//!
//! The schema lives in `migrations/` and is embedded at compile time with
//! `sqlx::migrate!`.
//!
//! # Example
//!
//! ```rust,no_run
//! use xfcollab::backend::realtime::AuditLog;
//! use xfcollab::backend::store::DocumentStore;
//! use xfcollab::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::builder().database_url("sqlite::memory:").build()?;
//! let store = DocumentStore::connect(&config, AuditLog::default()).await?;
//! let history = store.load("notes").await?;
//! assert!(history.is_empty());
//! store.on_close().await;
//! # Ok(())
//! # }
//! ```

/// Database operations for document histories
pub mod db;

pub use db::DocumentStore;
