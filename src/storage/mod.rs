//! SQLite-backed persistence: the deduplicating item store and the
//! append-only fetch log.
//!
//! Dedup rides on the database's native unique-constraint-with-ignore
//! semantics rather than application-level locking, so concurrent writers
//! cannot corrupt the one-row-per-link invariant.

mod fetch_log;
mod items;
mod schema;
mod types;

pub use items::DEFAULT_ITEM_LIMIT;
pub use schema::Database;
pub use types::{StorageError, StoredItem};
