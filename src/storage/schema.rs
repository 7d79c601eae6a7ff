use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::StorageError;

// ============================================================================
// Database
// ============================================================================

/// Process-wide store handle. Cheap to clone (wraps a connection pool);
/// constructed once at startup and passed into the ingestion service.
#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a database connection and run migrations.
    ///
    /// Pass `":memory:"` for an in-memory database (used throughout the
    /// tests).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Migration`] if the schema could not be set up,
    /// [`StorageError::Database`] for connection-level failures.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: SQLite waits up to 5 seconds for locks to release
        // before returning SQLITE_BUSY, which absorbs transient contention
        // between concurrent save and load operations.
        let options = SqliteConnectOptions::from_str(&url)?.pragma("busy_timeout", "5000");

        // SQLite is single-writer; a handful of connections covers concurrent
        // readers alongside the one writing refresh. An in-memory database
        // exists per connection, so it gets exactly one.
        let max_connections = if path == ":memory:" { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate()
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;
        Ok(db)
    }

    /// Run schema migrations atomically within a transaction.
    ///
    /// All statements use `IF NOT EXISTS`, so re-running on an existing
    /// database is a no-op. The unique index on `items.link` is what gives
    /// the write path its insert-or-ignore dedup semantics; no
    /// application-level locking is involved.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                link TEXT NOT NULL UNIQUE,
                guid TEXT NOT NULL DEFAULT '',
                pub_date TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                image TEXT NOT NULL DEFAULT '',
                categories TEXT NOT NULL DEFAULT '[]',
                stored_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        // Composite index for load_items: filters by source, orders by
        // storage time descending.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_items_source_stored ON items(source, stored_at DESC)",
        )
        .execute(&mut *tx)
        .await?;

        // Append-only fetch log; the most recent row per source decides
        // freshness.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fetch_log (
                id INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                fetched_at INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_fetch_log_source ON fetch_log(source, fetched_at DESC)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
