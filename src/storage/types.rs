use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-layer errors.
///
/// Expected unique-link collisions never surface here; they are swallowed by
/// the insert-or-ignore write path. Everything else does.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Migration failed while opening the database
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// Persisted form of a feed item.
///
/// At most one row exists per link; a later fetch of the same link never
/// refreshes the stored fields. `categories` is stored as a JSON array in a
/// TEXT column and deserialized on read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredItem {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub link: String,
    pub guid: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
    pub description: String,
    pub content: String,
    pub image: String,
    pub categories: Vec<String>,
    pub stored_at: i64,
}

/// Internal row type for item queries (used by sqlx FromRow).
/// Converts to [`StoredItem`] via `into_stored()` with categories decoding.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub link: String,
    pub guid: String,
    pub pub_date: String,
    pub description: String,
    pub content: String,
    pub image: String,
    pub categories: String,
    pub stored_at: i64,
}

impl ItemRow {
    pub(crate) fn into_stored(self) -> StoredItem {
        let categories = match serde_json::from_str(&self.categories) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(
                    link = %self.link,
                    error = %e,
                    "Malformed categories column, treating as empty"
                );
                Vec::new()
            }
        };
        StoredItem {
            id: self.id,
            source: self.source,
            title: self.title,
            link: self.link,
            guid: self.guid,
            pub_date: self.pub_date,
            description: self.description,
            content: self.content,
            image: self.image,
            categories,
            stored_at: self.stored_at,
        }
    }
}
