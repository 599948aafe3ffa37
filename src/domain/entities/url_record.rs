//! URL record entity carrying the click counters of a short link.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A shortened URL together with its aggregated click counters.
///
/// This is the row returned by the point read on a cache miss and the value
/// held in the read-through cache. Counters are only ever changed by the
/// backing store when a batch of [`crate::domain::click_delta::PendingDelta`]
/// is applied, so a cached copy goes stale after a flush until invalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlRecord {
    pub id: i64,
    pub short_id: String,
    pub original_url: String,
    pub total_clicks: i64,
    pub unique_clicks: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UrlRecord {
    /// Creates a new UrlRecord instance.
    pub fn new(
        id: i64,
        short_id: String,
        original_url: String,
        total_clicks: i64,
        unique_clicks: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            short_id,
            original_url,
            total_clicks,
            unique_clicks,
            created_at,
            updated_at,
        }
    }

    /// Share of clicks that came from first-time visitors, in `0.0..=1.0`.
    ///
    /// Returns `0.0` for a link that has never been clicked.
    pub fn unique_ratio(&self) -> f64 {
        if self.total_clicks <= 0 {
            0.0
        } else {
            self.unique_clicks as f64 / self.total_clicks as f64
        }
    }
}
