//! # Click Cache
//!
//! Read-through caching and write coalescing for URL click counters backed by
//! PostgreSQL.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Records, pending deltas, the store trait, and the click aggregator
//! - **Application Layer** ([`application`]) - The [`ClickTracker`] facade
//! - **Infrastructure Layer** ([`infrastructure`]) - LRU/TTL cache and the PostgreSQL store
//!
//! ## Features
//!
//! - Bounded LRU cache with per-entry TTL and O(1) hits and evictions
//! - Per-key click coalescing with at most one flush in flight
//! - Lossless requeue of failed batches
//! - Exponential backoff for transient store errors only
//! - Graceful drain on shutdown
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use click_cache::config::TrackerConfig;
//! use click_cache::domain::entities::UrlRecord;
//! use click_cache::infrastructure::cache::LruTtlCache;
//! use click_cache::infrastructure::persistence::PgClickStore;
//! use click_cache::ClickTracker;
//!
//! # async fn run(pool: sqlx::PgPool) -> anyhow::Result<()> {
//! let config = TrackerConfig::default();
//! let store = Arc::new(PgClickStore::new(Arc::new(pool)));
//! let cache = Arc::new(LruTtlCache::<UrlRecord>::new(config.cache_capacity, config.cache_ttl));
//! let tracker = ClickTracker::new(store, cache, config.flush_settings());
//!
//! if let Some(record) = tracker.lookup("abc123").await? {
//!     tracker.record_click(&record.short_id, true);
//! }
//!
//! tracker.shutdown().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! Settings are loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod telemetry;
pub mod utils;

pub use application::services::ClickTracker;
pub use error::StoreError;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::ClickTracker;
    pub use crate::config::TrackerConfig;
    pub use crate::domain::click_aggregator::{BufferLimit, ClickAggregator, FlushSettings};
    pub use crate::domain::click_delta::PendingDelta;
    pub use crate::domain::entities::UrlRecord;
    pub use crate::domain::repositories::ClickStore;
    pub use crate::error::StoreError;
    pub use crate::infrastructure::cache::{CacheService, LruTtlCache, NullCache};
    pub use crate::utils::retry::RetryPolicy;
}
