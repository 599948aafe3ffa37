//! Caching layer for fast record lookups.
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`LruTtlCache`] - Process-local bounded cache with LRU eviction and TTL
//! - [`NullCache`] - No-op implementation for testing/disabled caching

mod lru_cache;
mod null_cache;
mod service;

pub use lru_cache::LruTtlCache;
pub use null_cache::NullCache;
pub use service::CacheService;
