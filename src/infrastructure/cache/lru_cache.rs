//! Process-local cache with least-recently-used eviction and per-entry TTL.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;
use tracing::debug;

use super::service::CacheService;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at <= now
    }
}

/// Bounded in-memory cache keyed by short id.
///
/// Recency is tracked by the underlying [`LruCache`] linked hash map, so a hit
/// (move to most-recent) and an eviction (drop least-recent) are both O(1).
/// Expired entries are not swept in the background; they are removed lazily
/// when a lookup touches them, or pushed out by capacity pressure.
///
/// A single mutex guards the map. It is never held across an `.await`.
///
/// The invalidation generation only changes while that mutex is held, so
/// [`CacheService::set_if_current`] cannot interleave with an invalidation.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use click_cache::infrastructure::cache::{CacheService, LruTtlCache};
///
/// let cache: LruTtlCache<i32> = LruTtlCache::new(2, Duration::from_secs(10));
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
///
/// assert_eq!(cache.get("a"), None);
/// assert_eq!(cache.get("b"), Some(2));
/// assert_eq!(cache.get("c"), Some(3));
/// ```
pub struct LruTtlCache<V> {
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl<V> LruTtlCache<V> {
    /// Creates a cache holding at most `capacity` entries (minimum 1), each
    /// living for `ttl` after its last `set`.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    fn insert(&self, entries: &mut LruCache<String, CacheEntry<V>>, key: &str, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };

        if let Some((evicted, _)) = entries.push(key.to_string(), entry)
            && evicted != key
        {
            metrics::counter!("click_cache_evictions_total").increment(1);
            debug!("Cache EVICT: {} (capacity {})", evicted, entries.cap());
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, CacheEntry<V>>> {
        // Every critical section leaves the map consistent, so a panic in
        // another holder does not invalidate it.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Clone + Send> CacheService<V> for LruTtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let now = Instant::now();

        let Some(entry) = entries.peek(key) else {
            metrics::counter!("click_cache_misses_total").increment(1);
            debug!("Cache MISS: {}", key);
            return None;
        };

        if entry.is_expired(now) {
            entries.pop(key);
            metrics::counter!("click_cache_expired_total").increment(1);
            metrics::counter!("click_cache_misses_total").increment(1);
            debug!("Cache EXPIRED: {}", key);
            return None;
        }

        metrics::counter!("click_cache_hits_total").increment(1);
        debug!("Cache HIT: {}", key);
        entries.get(key).map(|entry| entry.value.clone())
    }

    fn set(&self, key: &str, value: V) {
        let mut entries = self.lock();
        self.insert(&mut entries, key, value);
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn set_if_current(&self, key: &str, value: V, generation: u64) -> bool {
        let mut entries = self.lock();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!("Cache SKIP: {} (invalidated during fetch)", key);
            return false;
        }

        self.insert(&mut entries, key, value);
        true
    }

    fn invalidate(&self, key: &str) {
        let mut entries = self.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        if entries.pop(key).is_some() {
            debug!("Cache INVALIDATE: {}", key);
        }
    }

    fn clear(&self) {
        let mut entries = self.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        entries.clear();
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
