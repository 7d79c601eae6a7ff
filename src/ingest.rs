//! The ingestion service: cache gate, fetch-parse-store orchestration, and
//! per-source single-flight.
//!
//! One call per source identifier: [`NewsService::get_items`] either serves
//! the stored corpus (fresh enough) or fetches, parses, persists, and reads
//! the corpus back. Storage dedup is idempotent and the fetch log is
//! append-only, so even overlapping refreshes cannot corrupt state; the
//! single-flight lock exists to avoid the duplicate outbound fetch itself.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::feed::{fetch_feed, parse_feed, Channel, FetchError};
use crate::storage::{Database, StorageError, StoredItem};

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced to the caller of [`NewsService::get_items`].
#[derive(Debug, Error)]
pub enum IngestError {
    /// The requested source identifier has no configured feed URL.
    /// No network or storage access is attempted.
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    /// Network/HTTP failure reaching the source
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Persistence-layer failure
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// ============================================================================
// Response
// ============================================================================

/// What a caller gets back for one source request.
///
/// `cached` is true when the cache gate judged the stored corpus fresh enough
/// to skip the network entirely. The channel is only present on a fresh
/// fetch; channels are never persisted.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub source: String,
    pub cached: bool,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub items: Vec<StoredItem>,
}

// ============================================================================
// Service
// ============================================================================

/// The ingestion pipeline's front door.
///
/// Owns the store handle, the HTTP client, and the source registry; created
/// once at process start and shared for the process lifetime.
pub struct NewsService {
    db: Database,
    client: reqwest::Client,
    sources: HashMap<String, String>,
    ttl: Duration,
    fetch_timeout: Duration,
    item_limit: i64,
    /// One flight per source: concurrent requests for the same stale source
    /// must not trigger duplicate outbound fetches.
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NewsService {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            client: reqwest::Client::new(),
            sources: config.sources.clone(),
            ttl: Duration::from_secs(config.ttl_minutes * 60),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            item_limit: config.item_limit,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// True when the stored corpus for `source` is older than the TTL or the
    /// source was never fetched. Read-only; safe to call repeatedly.
    pub async fn needs_refresh(&self, source: &str) -> Result<bool, StorageError> {
        let last = self.db.last_fetched(source).await?;
        Ok(is_stale(
            last,
            chrono::Utc::now().timestamp(),
            self.ttl.as_secs() as i64,
        ))
    }

    /// Items for a source: freshly ingested or served from the store.
    pub async fn get_items(&self, source: &str) -> Result<FeedResponse, IngestError> {
        let url = self
            .sources
            .get(source)
            .ok_or_else(|| IngestError::UnknownSource(source.to_string()))?
            .clone();

        let flight = self.flight(source).await;
        let _guard = flight.lock().await;

        if !self.needs_refresh(source).await? {
            let items = self.db.load_items(source, Some(self.item_limit)).await?;
            tracing::debug!(source = source, count = items.len(), "Serving items from cache");
            return Ok(FeedResponse {
                source: source.to_string(),
                cached: true,
                timestamp: chrono::Utc::now().timestamp(),
                channel: None,
                items,
            });
        }

        let raw = fetch_feed(&self.client, &url, self.fetch_timeout).await?;
        let parsed = parse_feed(&raw);
        let new_items = self.db.save_items(source, &parsed.items).await?;
        tracing::info!(
            source = source,
            parsed = parsed.items.len(),
            new = new_items,
            "Feed refreshed"
        );

        // Read back from the store: it enforces the link invariant and the
        // retrieval cap, so both paths return the same shape.
        let items = self.db.load_items(source, Some(self.item_limit)).await?;
        Ok(FeedResponse {
            source: source.to_string(),
            cached: false,
            timestamp: chrono::Utc::now().timestamp(),
            channel: Some(parsed.channel),
            items,
        })
    }

    async fn flight(&self, source: &str) -> Arc<Mutex<()>> {
        let mut flights = self.flights.lock().await;
        flights.entry(source.to_string()).or_default().clone()
    }
}

/// TTL comparison, factored out so freshness is testable without a clock.
fn is_stale(last_fetched: Option<i64>, now: i64, ttl_secs: i64) -> bool {
    match last_fetched {
        Some(fetched_at) => now - fetched_at > ttl_secs,
        None => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
