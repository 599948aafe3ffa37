//! Repository trait for the backing store of URL records and counters.

use crate::domain::click_delta::PendingDelta;
use crate::domain::entities::UrlRecord;
use crate::error::StoreError;
use async_trait::async_trait;

/// Boundary contract between the caching/coalescing core and persistent
/// storage.
///
/// Implementations are expected to enforce their own per-call timeouts.
/// Every failure must be classified as [`StoreError::Transient`] or
/// [`StoreError::Permanent`]; only the former is retried.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickStore`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickStore: Send + Sync {
    /// Reads a single record by key. Idempotent.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(UrlRecord))` if found
    /// - `Ok(None)` if not found
    async fn fetch_record(&self, key: &str) -> Result<Option<UrlRecord>, StoreError>;

    /// Applies every delta as one atomic unit: either all counters are
    /// updated or none are.
    ///
    /// Called with a non-empty batch containing at most one delta per key.
    async fn apply_batched_deltas(&self, deltas: Vec<PendingDelta>) -> Result<(), StoreError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
