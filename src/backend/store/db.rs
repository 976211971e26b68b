/**
 * Database Operations for Document Histories
 *
 * This module persists committed history to SQLite. Each document has a
 * record holding its compaction offset (`start`) and the number of
 * persisted transactions (`length`); transactions live in their own table
 * keyed by absolute history position.
 *
 * Appends are optimistic: the record is advanced with a conditional
 * `UPDATE ... WHERE start + length = ?` inside the same SQL transaction
 * that inserts the rows, so two writers racing for the same position cannot
 * both succeed, whether they share this instance or not.
 */

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::realtime::AuditLog;
use crate::shared::change::StoreSnapshot;
use crate::shared::{AppConfig, AuditEvent, Change, Transaction};

const OPTIONS_KEY: &str = "default";

/// Persistent, optimistic-append store of document histories
#[derive(Debug)]
pub struct DocumentStore {
    pool: SqlitePool,
    server_id: Uuid,
    /// Expected next start per loaded document
    expected_starts: Mutex<HashMap<String, usize>>,
    audit: AuditLog,
}

impl DocumentStore {
    /// Open the database, run migrations and resolve the server id
    ///
    /// The server id is created on first use and shared by every process
    /// using the same database.
    ///
    /// # Errors
    ///
    /// `Storage` when the database cannot be opened, `Migration` when the
    /// schema cannot be brought up to date.
    pub async fn connect(config: &AppConfig, audit: AuditLog) -> Result<Self, BackendError> {
        tracing::info!("[Store] Connecting to {}", config.database_url);

        let mut options = SqliteConnectOptions::from_str(&config.database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let mut pool_options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if config.is_in_memory() {
            // Every connection to :memory: is a separate database
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("[Store] Database migrations completed successfully");

        let server_id = resolve_server_id(&pool).await?;
        audit.log(AuditEvent::Connected { server_id });
        tracing::info!("[Store] Connected as server {}", server_id);

        Ok(Self {
            pool,
            server_id,
            expected_starts: Mutex::new(HashMap::new()),
            audit,
        })
    }

    /// Identifier shared by every process using this database
    pub fn server_id(&self) -> Uuid {
        self.server_id
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Load a document's committed history, creating an empty record if needed
    ///
    /// Also resets this instance's expected next start for the document to
    /// the end of what was loaded.
    pub async fn load(&self, doc: &str) -> Result<Change, BackendError> {
        let mut starts = self.expected_starts.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO documents (doc_name, start, length, created_at)
             VALUES (?, 0, 0, ?)
             ON CONFLICT (doc_name) DO NOTHING",
        )
        .bind(doc)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let record = sqlx::query("SELECT start, length FROM documents WHERE doc_name = ?")
            .bind(doc)
            .fetch_one(&mut *tx)
            .await?;
        let start = to_position(record.try_get("start")?, "start")?;
        let length = to_position(record.try_get("length")?, "length")?;

        let rows = sqlx::query(
            "SELECT seq, transaction_json, store_json
             FROM document_transactions
             WHERE doc_name = ?
             ORDER BY seq ASC",
        )
        .bind(doc)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        if rows.len() != length {
            return Err(BackendError::state(format!(
                "document {} records {} transactions but {} are stored",
                doc,
                length,
                rows.len()
            )));
        }

        let mut transactions = Vec::with_capacity(rows.len());
        let mut stores = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let seq = to_position(row.try_get("seq")?, "seq")?;
            if seq != start + i {
                return Err(BackendError::state(format!(
                    "document {} has a gap at position {}",
                    doc,
                    start + i
                )));
            }
            let transaction_json: String = row.try_get("transaction_json")?;
            let store_json: Option<String> = row.try_get("store_json")?;
            transactions.push(serde_json::from_str::<Transaction>(&transaction_json)?);
            stores.push(
                store_json
                    .map(|json| serde_json::from_str::<StoreSnapshot>(&json))
                    .transpose()?,
            );
        }

        let history = Change::new(start, transactions, stores, BTreeMap::new())?;
        starts.insert(doc.to_string(), history.end());

        tracing::info!(
            "[Store] Loaded {} transactions for {} starting at {}",
            length,
            doc,
            start
        );
        self.audit.log(AuditEvent::Loaded {
            doc: doc.to_string(),
            start,
            length,
        });
        Ok(history)
    }

    /// Append a committed change to a loaded document
    ///
    /// # Errors
    ///
    /// - `DocumentNotLoaded` when this instance never loaded `doc`
    /// - `UnmatchedStarts` when `change` does not start at the expected
    ///   position, or another writer advanced the record first
    pub async fn on_new_change(&self, doc: &str, change: &Change) -> Result<(), BackendError> {
        let mut starts = self.expected_starts.lock().await;
        let expected = *starts
            .get(doc)
            .ok_or_else(|| BackendError::not_loaded(doc))?;
        if change.start() != expected {
            return Err(BackendError::unmatched_starts(doc, expected, change.start()));
        }

        let mut tx = self.pool.begin().await?;
        let advanced = sqlx::query(
            "UPDATE documents SET length = length + ?
             WHERE doc_name = ? AND start + length = ?",
        )
        .bind(change.length() as i64)
        .bind(doc)
        .bind(expected as i64)
        .execute(&mut *tx)
        .await?;

        if advanced.rows_affected() != 1 {
            let current: Option<(i64, i64)> =
                sqlx::query_as("SELECT start, length FROM documents WHERE doc_name = ?")
                    .bind(doc)
                    .fetch_optional(&mut *tx)
                    .await?;
            tx.rollback().await?;
            let Some((start, length)) = current else {
                return Err(BackendError::not_loaded(doc));
            };
            let persisted_end = to_position(start + length, "end")?;
            tracing::warn!(
                "[Store] Append to {} at {} lost the race, record ends at {}",
                doc,
                expected,
                persisted_end
            );
            return Err(BackendError::unmatched_starts(doc, persisted_end, change.start()));
        }

        for (i, (transaction, store)) in change.transactions().iter().zip(change.stores()).enumerate() {
            let transaction_json = serde_json::to_string(transaction)?;
            let store_json = store.as_ref().map(serde_json::to_string).transpose()?;
            sqlx::query(
                "INSERT INTO document_transactions (doc_name, seq, transaction_json, store_json)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(doc)
            .bind((expected + i) as i64)
            .bind(transaction_json)
            .bind(store_json)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        starts.insert(doc.to_string(), change.end());

        tracing::debug!(
            "[Store] Appended {} transactions to {} at {}",
            change.length(),
            doc,
            change.start()
        );
        self.audit.log(AuditEvent::OnNewChange {
            doc: doc.to_string(),
            start: change.start(),
            length: change.length(),
            end: change.end(),
        });
        Ok(())
    }

    /// Names of every persisted document
    pub async fn list_documents(&self) -> Result<Vec<String>, BackendError> {
        let rows = sqlx::query("SELECT doc_name FROM documents ORDER BY doc_name ASC")
            .fetch_all(&self.pool)
            .await?;
        let mut names: Vec<String> = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(row.try_get("doc_name")?);
        }
        Ok(names)
    }

    /// Delete every persisted document and the options record
    pub async fn drop_database(&self) -> Result<(), BackendError> {
        let mut starts = self.expected_starts.lock().await;
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM document_transactions")
            .execute(&mut *tx)
            .await?;
        let removed = sqlx::query("DELETE FROM documents").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM server_options")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        starts.clear();

        tracing::warn!("[Store] Dropped {} documents", removed.rows_affected());
        self.audit.log(AuditEvent::DropDatabase {
            documents: removed.rows_affected(),
        });
        Ok(())
    }

    /// Close the connection pool
    pub async fn on_close(&self) {
        self.pool.close().await;
        tracing::info!("[Store] Connection pool closed");
        self.audit.log(AuditEvent::OnClose);
    }
}

async fn resolve_server_id(pool: &SqlitePool) -> Result<Uuid, BackendError> {
    sqlx::query(
        "INSERT INTO server_options (id, server_id, created_at)
         VALUES (?, ?, ?)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(OPTIONS_KEY)
    .bind(Uuid::new_v4().to_string())
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let row = sqlx::query("SELECT server_id FROM server_options WHERE id = ?")
        .bind(OPTIONS_KEY)
        .fetch_one(pool)
        .await?;
    let server_id: String = row.try_get("server_id")?;
    Uuid::parse_str(&server_id)
        .map_err(|e| BackendError::state(format!("stored server id {:?} is invalid: {}", server_id, e)))
}

fn to_position(value: i64, column: &str) -> Result<usize, BackendError> {
    usize::try_from(value).map_err(|_| BackendError::state(format!("negative {} {} in store", column, value)))
}
