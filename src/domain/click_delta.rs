//! Counter delta model for coalesced click updates.

/// Accumulated, not-yet-written counter increments for one short link.
///
/// Deltas are merged by integer addition, which is commutative and
/// associative. A batch that failed to flush can therefore be merged back
/// into the live buffer in any order without over- or under-counting.
///
/// Both counters are non-negative: they are only ever built from
/// [`PendingDelta::click`] and [`PendingDelta::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelta {
    pub key: String,
    pub total_delta: i64,
    pub unique_delta: i64,
}

impl PendingDelta {
    /// Creates an empty delta for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            total_delta: 0,
            unique_delta: 0,
        }
    }

    /// Creates the delta of a single click.
    pub fn click(key: impl Into<String>, is_unique: bool) -> Self {
        let mut delta = Self::new(key);
        delta.add_click(is_unique);
        delta
    }

    /// Adds one click, counting it as unique if `is_unique`.
    pub fn add_click(&mut self, is_unique: bool) {
        self.total_delta = self.total_delta.saturating_add(1);
        if is_unique {
            self.unique_delta = self.unique_delta.saturating_add(1);
        }
    }

    /// Adds another delta's counters into this one.
    pub fn merge(&mut self, other: &PendingDelta) {
        debug_assert_eq!(self.key, other.key);
        self.total_delta = self.total_delta.saturating_add(other.total_delta);
        self.unique_delta = self.unique_delta.saturating_add(other.unique_delta);
    }
}
