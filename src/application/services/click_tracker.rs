//! Caller-facing API for record lookups and click recording.

use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::click_aggregator::{ClickAggregator, FlushSettings};
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::ClickStore;
use crate::error::StoreError;
use crate::infrastructure::cache::CacheService;
use crate::utils::retry::RetryPolicy;

/// Service combining the read-through cache with the click aggregator.
///
/// Request handlers hold one shared instance (behind an `Arc`) and use:
/// - [`Self::lookup`] to resolve a short id, cache first
/// - [`Self::record_click`] to count a visit without touching the store
/// - [`Self::invalidate`] after mutating a record out of band
pub struct ClickTracker<S: ClickStore + 'static> {
    store: Arc<S>,
    cache: Arc<dyn CacheService<UrlRecord>>,
    aggregator: ClickAggregator<S>,
    retry: RetryPolicy,
}

impl<S: ClickStore + 'static> ClickTracker<S> {
    /// Creates a new click tracker.
    ///
    /// The same `cache` backs lookups and receives invalidations from the
    /// aggregator after each successful flush.
    pub fn new(
        store: Arc<S>,
        cache: Arc<dyn CacheService<UrlRecord>>,
        settings: FlushSettings,
    ) -> Self {
        let aggregator = ClickAggregator::new(store.clone(), cache.clone(), settings);

        Self {
            store,
            cache,
            aggregator,
            retry: settings.retry,
        }
    }

    /// Resolves `key` from the cache, falling back to the store on a miss.
    ///
    /// A record fetched from the store populates the cache, unless the cache
    /// saw an invalidation while the fetch was in progress (a flush may have
    /// committed newer counters after the row was read). Absent records are
    /// not cached.
    ///
    /// # Errors
    ///
    /// Returns the store's [`StoreError`] if the fallback read fails
    /// permanently or exhausts its retries. Nothing is cached in that case.
    pub async fn lookup(&self, key: &str) -> Result<Option<UrlRecord>, StoreError> {
        if let Some(record) = self.cache.get(key) {
            return Ok(Some(record));
        }

        let generation = self.cache.generation();
        let record = self.lookup_uncached(key).await?;

        if let Some(record) = &record
            && !self.cache.set_if_current(key, record.clone(), generation)
        {
            debug!("Not caching {}: invalidated during fetch", key);
        }

        Ok(record)
    }

    /// Reads `key` straight from the store, bypassing the cache in both
    /// directions.
    ///
    /// # Errors
    ///
    /// See [`Self::lookup`].
    pub async fn lookup_uncached(&self, key: &str) -> Result<Option<UrlRecord>, StoreError> {
        debug!("Fetching record {} from store", key);

        self.retry
            .run(|| self.store.fetch_record(key))
            .await
            .inspect_err(|e| error!("Failed to fetch record {}: {}", key, e))
    }

    /// Counts one click for `key` and makes sure a flush is scheduled.
    ///
    /// Never waits for the store. Returns `false` if the click was dropped by
    /// the configured buffer limit.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn record_click(&self, key: &str, is_unique: bool) -> bool {
        let accepted = self.aggregator.enqueue(key, is_unique);
        self.aggregator.schedule_flush();
        accepted
    }

    /// Drops the cached record for `key`.
    pub fn invalidate(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// Writes out every buffered click. Call once before process exit.
    ///
    /// # Errors
    ///
    /// Returns the final flush error; the unwritten deltas stay buffered.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.aggregator.shutdown().await
    }

    pub fn aggregator(&self) -> &ClickAggregator<S> {
        &self.aggregator
    }
}
