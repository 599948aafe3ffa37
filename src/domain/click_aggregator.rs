//! Write-coalescing aggregator for click counters.
//!
//! Request handlers call [`ClickAggregator::enqueue`] instead of writing to the
//! backing store. Deltas for the same key are merged in memory and written
//! periodically as one all-or-nothing batch.
//!
//! # Flush Cycle
//!
//! 1. [`ClickAggregator::schedule_flush`] takes the whole live buffer and
//!    replaces it with an empty one in the same critical section that moves
//!    the state from `Idle` to `Flushing`
//! 2. A background task writes the batch through the [`RetryPolicy`]
//! 3. On success, the cache entries of every flushed key are invalidated
//! 4. On failure, every delta of the batch is added back into the live buffer
//! 5. The state returns to `Idle`; if clicks arrived in the meantime, the task
//!    waits for the re-trigger delay and starts the next cycle
//!
//! At most one flush is in flight at any time. Clicks enqueued during a flush
//! land in the new buffer and are written by the next cycle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::domain::click_delta::PendingDelta;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::ClickStore;
use crate::error::StoreError;
use crate::infrastructure::cache::CacheService;
use crate::utils::retry::RetryPolicy;

/// Policy bounding the number of distinct keys in the live buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferLimit {
    /// No bound. The buffer grows with the number of distinct clicked keys
    /// for as long as the store stays unavailable.
    #[default]
    Unbounded,
    /// Clicks for keys already pending are always merged. A click for a new
    /// key is rejected once this many keys are pending. Deltas requeued after
    /// a failed flush are never rejected.
    MaxKeys(usize),
}

/// Tuning knobs of the flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushSettings {
    pub retry: RetryPolicy,
    /// Pause before starting another cycle when the buffer refilled during a flush.
    pub retrigger_delay: Duration,
    pub buffer_limit: BufferLimit,
}

impl Default for FlushSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            retrigger_delay: Duration::from_millis(100),
            buffer_limit: BufferLimit::Unbounded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushPhase {
    Idle,
    Flushing,
}

struct BufferState {
    pending: HashMap<String, PendingDelta>,
    phase: FlushPhase,
}

struct FlushOutcome {
    result: Result<(), StoreError>,
    more_pending: bool,
}

struct Shared<S> {
    state: Mutex<BufferState>,
    idle: Notify,
    store: Arc<S>,
    cache: Arc<dyn CacheService<UrlRecord>>,
    settings: FlushSettings,
}

/// Buffers per-key click deltas and writes them in coalesced batches.
///
/// Cloning is cheap and every clone shares the same buffer, so one instance
/// is constructed per process and handed to each request handler.
pub struct ClickAggregator<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for ClickAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<S: ClickStore + 'static> ClickAggregator<S> {
    /// Creates an idle aggregator with an empty buffer.
    ///
    /// `cache` receives an invalidation for every key whose counters were
    /// successfully written.
    pub fn new(
        store: Arc<S>,
        cache: Arc<dyn CacheService<UrlRecord>>,
        settings: FlushSettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(BufferState {
                    pending: HashMap::new(),
                    phase: FlushPhase::Idle,
                }),
                idle: Notify::new(),
                store,
                cache,
                settings,
            }),
        }
    }

    /// Merges one click for `key` into the live buffer.
    ///
    /// Never blocks on I/O and never fails. Returns `false` only when the
    /// click was dropped by [`BufferLimit::MaxKeys`].
    pub fn enqueue(&self, key: &str, is_unique: bool) -> bool {
        let mut state = self.shared.lock();

        if let Some(delta) = state.pending.get_mut(key) {
            delta.add_click(is_unique);
        } else {
            if let BufferLimit::MaxKeys(max_keys) = self.shared.settings.buffer_limit
                && state.pending.len() >= max_keys
            {
                drop(state);
                metrics::counter!("clicks_rejected_total").increment(1);
                warn!(
                    "Click buffer full ({} keys), dropping click for {}",
                    max_keys, key
                );
                return false;
            }
            state
                .pending
                .insert(key.to_string(), PendingDelta::click(key, is_unique));
        }

        metrics::gauge!("click_pending_keys").set(state.pending.len() as f64);
        metrics::counter!("clicks_enqueued_total").increment(1);
        true
    }

    /// Starts a flush cycle in the background.
    ///
    /// No-op (returns `false`) if a flush is already in flight or the buffer
    /// is empty.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn schedule_flush(&self) -> bool {
        let Some(batch) = self.shared.begin_flush() else {
            return false;
        };

        tokio::spawn(self.shared.clone().run_flush_cycle(batch));
        true
    }

    /// Resolves once no flush is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.is_flushing() {
                return;
            }
            notified.await;
        }
    }

    /// Drains the buffer before process exit.
    ///
    /// Waits for an in-flight flush to finish, then writes whatever is left
    /// in the buffer in the calling task. On failure the deltas are requeued
    /// and the final error is returned.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        loop {
            self.wait_idle().await;

            match self.shared.begin_flush() {
                Some(batch) => {
                    let outcome = self.shared.execute_flush(batch).await;
                    outcome.result?;
                    if !outcome.more_pending {
                        return Ok(());
                    }
                }
                None if !self.is_flushing() => return Ok(()),
                None => {}
            }
        }
    }

    /// Returns the buffered delta for `key`, if any.
    pub fn pending(&self, key: &str) -> Option<PendingDelta> {
        self.shared.lock().pending.get(key).cloned()
    }

    /// Number of distinct keys waiting in the live buffer.
    pub fn pending_len(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn is_flushing(&self) -> bool {
        self.shared.lock().phase == FlushPhase::Flushing
    }
}

impl<S: ClickStore + 'static> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, BufferState> {
        // Critical sections never panic halfway through a mutation.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot-and-clear: the only transition from `Idle` to `Flushing`.
    fn begin_flush(&self) -> Option<Vec<PendingDelta>> {
        let mut state = self.lock();

        if state.phase == FlushPhase::Flushing || state.pending.is_empty() {
            return None;
        }

        state.phase = FlushPhase::Flushing;
        let batch = std::mem::take(&mut state.pending);
        metrics::gauge!("click_pending_keys").set(0.0);

        Some(batch.into_values().collect())
    }

    /// Writes one batch and moves back to `Idle`.
    async fn execute_flush(&self, batch: Vec<PendingDelta>) -> FlushOutcome {
        debug!("Flushing click deltas for {} keys", batch.len());

        let result = self
            .settings
            .retry
            .run(|| self.store.apply_batched_deltas(batch.clone()))
            .await;

        if result.is_ok() {
            for delta in &batch {
                self.cache.invalidate(&delta.key);
            }
        }

        let more_pending = {
            let mut state = self.lock();

            if result.is_err() {
                for delta in &batch {
                    state
                        .pending
                        .entry(delta.key.clone())
                        .and_modify(|live| live.merge(delta))
                        .or_insert_with(|| delta.clone());
                }
            }

            state.phase = FlushPhase::Idle;
            metrics::gauge!("click_pending_keys").set(state.pending.len() as f64);
            !state.pending.is_empty()
        };
        self.idle.notify_waiters();

        match &result {
            Ok(()) => {
                metrics::counter!("click_flushes_total", "outcome" => "success").increment(1);
                metrics::counter!("click_flush_keys_total").increment(batch.len() as u64);
                info!("Flushed click deltas for {} keys", batch.len());
            }
            Err(e) if e.is_transient() => {
                metrics::counter!("click_flushes_total", "outcome" => "failure").increment(1);
                warn!(
                    "Click flush failed after retries, requeued {} keys: {}",
                    batch.len(),
                    e
                );
            }
            Err(e) => {
                metrics::counter!("click_flushes_total", "outcome" => "failure").increment(1);
                error!("Click flush rejected, requeued {} keys: {}", batch.len(), e);
            }
        }

        FlushOutcome {
            result,
            more_pending,
        }
    }

    async fn run_flush_cycle(self: Arc<Self>, mut batch: Vec<PendingDelta>) {
        loop {
            let outcome = self.execute_flush(batch).await;
            if !outcome.more_pending {
                return;
            }

            tokio::time::sleep(self.settings.retrigger_delay).await;

            match self.begin_flush() {
                Some(next) => batch = next,
                None => return,
            }
        }
    }
}
