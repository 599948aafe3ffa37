//! No-op cache implementation for testing or disabled caching.

use super::service::CacheService;
use tracing::debug;

/// A cache implementation that does nothing.
///
/// Every lookup misses, so callers always fall through to the backing store.
///
/// # Use Cases
///
/// - Deployments that need every read to be authoritative
/// - Testing scenarios where caching should be bypassed
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheService<V> for NullCache {
    fn get(&self, _key: &str) -> Option<V> {
        None
    }

    fn set(&self, _key: &str, _value: V) {}

    fn generation(&self) -> u64 {
        0
    }

    fn set_if_current(&self, _key: &str, _value: V, _generation: u64) -> bool {
        true
    }

    fn invalidate(&self, _key: &str) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}
