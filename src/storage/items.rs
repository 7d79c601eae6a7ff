use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{ItemRow, StorageError, StoredItem};
use crate::feed::Item;

// ============================================================================
// Query Limit Constants
// ============================================================================

/// Default number of items returned by [`Database::load_items`].
pub const DEFAULT_ITEM_LIMIT: i64 = 50;

/// Hard cap on any single read (OOM protection)
const MAX_ITEMS: i64 = 500;

/// Batch size keeps us well under SQLite's 999 parameter limit
/// (10 columns * 50 rows = 500).
const BATCH_SIZE: usize = 50;

impl Database {
    // ========================================================================
    // Item Operations
    // ========================================================================

    /// Persist parsed items for a source and record the fetch.
    ///
    /// Items are keyed by link with INSERT OR IGNORE: a re-fetched link is a
    /// no-op, never an update: stored fields are not refreshed by later
    /// fetches. Items without a link cannot be deduplicated and are skipped.
    ///
    /// A fetch-log record for `source` is appended unconditionally, even when
    /// zero items were new: the fetch itself happened, and recording it is
    /// what prevents an immediate refetch storm. Both the inserts and the
    /// log append commit in a single transaction.
    ///
    /// Returns the number of newly inserted items.
    pub async fn save_items(&self, source: &str, items: &[Item]) -> Result<usize, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let keep: Vec<&Item> = items.iter().filter(|item| !item.link.is_empty()).collect();

        let skipped = items.len() - keep.len();
        if skipped > 0 {
            tracing::warn!(
                source = source,
                skipped = skipped,
                "Items without a link skipped (cannot deduplicate)"
            );
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted: usize = 0;

        for chunk in keep.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT OR IGNORE INTO items \
                 (source, title, link, guid, pub_date, description, content, image, categories, stored_at) ",
            );

            builder.push_values(chunk, |mut b, item| {
                let categories =
                    serde_json::to_string(&item.categories).unwrap_or_else(|_| "[]".to_string());
                b.push_bind(source)
                    .push_bind(&item.title)
                    .push_bind(&item.link)
                    .push_bind(&item.guid)
                    .push_bind(&item.pub_date)
                    .push_bind(&item.description)
                    .push_bind(&item.content)
                    .push_bind(&item.image)
                    .push_bind(categories)
                    .push_bind(now);
            });

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected() as usize;
        }

        sqlx::query("INSERT INTO fetch_log (source, fetched_at) VALUES (?, ?)")
            .bind(source)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            source = source,
            received = items.len(),
            inserted = inserted,
            "Saved items"
        );
        Ok(inserted)
    }

    /// Most recently stored items for a source, newest first.
    ///
    /// `limit` defaults to [`DEFAULT_ITEM_LIMIT`] and is capped at 500.
    /// Categories come back as an ordered sequence, exactly as parsed.
    pub async fn load_items(
        &self,
        source: &str,
        limit: Option<i64>,
    ) -> Result<Vec<StoredItem>, StorageError> {
        let limit = limit.unwrap_or(DEFAULT_ITEM_LIMIT).min(MAX_ITEMS);

        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, source, title, link, guid, pub_date, description, content,
                   image, categories, stored_at
            FROM items
            WHERE source = ?
            ORDER BY stored_at DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(source)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ItemRow::into_stored).collect())
    }
}
