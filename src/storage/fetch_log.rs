use super::schema::Database;
use super::types::StorageError;

impl Database {
    // ========================================================================
    // Fetch Log Operations
    // ========================================================================

    /// Append a fetch record for `source` with an explicit timestamp.
    ///
    /// The normal write path is [`Database::save_items`], which stamps the
    /// current time inside its transaction; this entry point exists for
    /// callers that need to control the clock (tests, backfills).
    pub async fn record_fetch_at(&self, source: &str, fetched_at: i64) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO fetch_log (source, fetched_at) VALUES (?, ?)")
            .bind(source)
            .bind(fetched_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Timestamp of the most recent fetch of `source`, if any.
    ///
    /// The log is append-only; only the newest record matters for freshness.
    pub async fn last_fetched(&self, source: &str) -> Result<Option<i64>, StorageError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT fetched_at FROM fetch_log WHERE source = ? ORDER BY fetched_at DESC LIMIT 1",
        )
        .bind(source)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(fetched_at,)| fetched_at))
    }
}
