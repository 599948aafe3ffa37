//! Cache service trait.

/// Key→value cache for records served on the hot lookup path.
///
/// All operations are total and purely in-memory: they never fail and never
/// suspend, so they are safe to call from any request-handling task.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::LruTtlCache`] - Bounded LRU cache with per-entry expiry
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
pub trait CacheService<V>: Send + Sync {
    /// Returns the cached value if present and unexpired.
    ///
    /// A hit marks the entry as most recently used. An expired entry touched
    /// by this call is dropped and reported as a miss.
    fn get(&self, key: &str) -> Option<V>;

    /// Inserts or overwrites a value, resetting its expiry.
    fn set(&self, key: &str, value: V);

    /// Invalidation counter, advanced by every [`Self::invalidate`] and
    /// [`Self::clear`].
    ///
    /// Read it before fetching a value from the backing store, then populate
    /// with [`Self::set_if_current`].
    fn generation(&self) -> u64;

    /// Like [`Self::set`], but only if no invalidation happened since
    /// `generation` was read. Returns `false` if an invalidation intervened.
    fn set_if_current(&self, key: &str, value: V, generation: u64) -> bool;

    /// Removes a cached value. Advances the generation even if absent.
    ///
    /// Used when the backing row changed, e.g. after a successful counter flush.
    fn invalidate(&self, key: &str);

    /// Removes every cached value.
    fn clear(&self);

    /// Number of entries currently held, including expired entries that
    /// have not been touched since they expired.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
