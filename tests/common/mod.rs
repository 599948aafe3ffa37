#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use click_cache::prelude::*;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory [`ClickStore`] with scripted failures.
///
/// Counts every call, records every applied batch, and flags any two
/// `apply_batched_deltas` calls that run at the same time.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<String, UrlRecord>>,
    failures: Mutex<VecDeque<StoreError>>,
    batches: Mutex<Vec<Vec<PendingDelta>>>,
    apply_delay: Duration,
    fetch_delay: Duration,
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    fetch_calls: AtomicUsize,
    apply_calls: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each `apply_batched_deltas` call sleeps this long before committing.
    pub fn with_apply_delay(delay: Duration) -> Self {
        Self {
            apply_delay: delay,
            ..Self::default()
        }
    }

    /// Each `fetch_record` call reads the row, then sleeps this long before
    /// returning it.
    pub fn with_fetch_delay(delay: Duration) -> Self {
        Self {
            fetch_delay: delay,
            ..Self::default()
        }
    }

    pub fn insert(&self, short_id: &str, url: &str) {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let id = records.len() as i64 + 1;
        records.insert(
            short_id.to_string(),
            UrlRecord::new(id, short_id.to_string(), url.to_string(), 0, 0, now, now),
        );
    }

    /// Makes the next store calls (of either kind) fail with `errors`, in order.
    pub fn fail_next(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.failures.lock().unwrap().extend(errors);
    }

    pub fn counters(&self, short_id: &str) -> Option<(i64, i64)> {
        self.records
            .lock()
            .unwrap()
            .get(short_id)
            .map(|r| (r.total_clicks, r.unique_clicks))
    }

    pub fn batches(&self) -> Vec<Vec<PendingDelta>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn apply_calls(&self) -> usize {
        self.apply_calls.load(Ordering::SeqCst)
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    fn next_failure(&self) -> Option<StoreError> {
        self.failures.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl ClickStore for FakeStore {
    async fn fetch_record(&self, key: &str) -> Result<Option<UrlRecord>, StoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.next_failure() {
            return Err(err);
        }

        let record = self.records.lock().unwrap().get(key).cloned();

        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        Ok(record)
    }

    async fn apply_batched_deltas(&self, deltas: Vec<PendingDelta>) -> Result<(), StoreError> {
        self.apply_calls.fetch_add(1, Ordering::SeqCst);

        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }

        if !self.apply_delay.is_zero() {
            tokio::time::sleep(self.apply_delay).await;
        }

        let result = match self.next_failure() {
            Some(err) => Err(err),
            None => {
                let mut records = self.records.lock().unwrap();
                for delta in &deltas {
                    if let Some(record) = records.get_mut(&delta.key) {
                        record.total_clicks += delta.total_delta;
                        record.unique_clicks += delta.unique_delta;
                        record.updated_at = Utc::now();
                    }
                }
                self.batches.lock().unwrap().push(deltas);
                Ok(())
            }
        };

        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self.next_failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn test_settings() -> FlushSettings {
    FlushSettings {
        retry: RetryPolicy::new(3, Duration::from_millis(100)),
        retrigger_delay: Duration::from_millis(100),
        buffer_limit: BufferLimit::Unbounded,
    }
}

pub async fn create_urls_table(pool: &sqlx::PgPool) {
    sqlx::query(
        r#"
        CREATE TABLE urls (
            id            BIGSERIAL PRIMARY KEY,
            short_id      TEXT NOT NULL UNIQUE,
            original_url  TEXT NOT NULL,
            total_clicks  BIGINT NOT NULL DEFAULT 0,
            unique_clicks BIGINT NOT NULL DEFAULT 0,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .unwrap();
}

pub async fn create_test_url(pool: &sqlx::PgPool, short_id: &str, url: &str) {
    sqlx::query("INSERT INTO urls (short_id, original_url) VALUES ($1, $2)")
        .bind(short_id)
        .bind(url)
        .execute(pool)
        .await
        .unwrap();
}
