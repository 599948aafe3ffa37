mod common;

use click_cache::prelude::*;
use common::{FakeStore, test_settings};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const TASKS: usize = 8;
const CLICKS_PER_TASK: usize = 500;
const KEYS: usize = 10;

fn click(task: usize, i: usize) -> (String, bool) {
    (format!("key{}", (task + i) % KEYS), (task * i) % 3 == 0)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_clicks_never_overlap_flushes() {
    let store = Arc::new(FakeStore::with_apply_delay(Duration::from_millis(1)));
    for k in 0..KEYS {
        store.insert(&format!("key{k}"), "https://example.com");
    }

    let settings = FlushSettings {
        retrigger_delay: Duration::from_millis(1),
        ..test_settings()
    };
    let tracker = Arc::new(ClickTracker::new(
        store.clone(),
        Arc::new(LruTtlCache::<UrlRecord>::new(KEYS, Duration::from_secs(900))),
        settings,
    ));

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                for i in 0..CLICKS_PER_TASK {
                    let (key, is_unique) = click(task, i);
                    assert!(tracker.record_click(&key, is_unique));
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    tracker.shutdown().await.unwrap();

    let mut expected: HashMap<String, (i64, i64)> = HashMap::new();
    for task in 0..TASKS {
        for i in 0..CLICKS_PER_TASK {
            let (key, is_unique) = click(task, i);
            let entry = expected.entry(key).or_default();
            entry.0 += 1;
            entry.1 += i64::from(is_unique);
        }
    }

    assert!(!store.overlapped(), "two flushes ran at the same time");
    assert_eq!(tracker.aggregator().pending_len(), 0);
    for (key, counters) in &expected {
        assert_eq!(store.counters(key), Some(*counters), "counters for {key}");
    }

    let written: i64 = store
        .batches()
        .iter()
        .flatten()
        .map(|d| d.total_delta)
        .sum();
    assert_eq!(written, (TASKS * CLICKS_PER_TASK) as i64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batches_hold_one_delta_per_key() {
    let store = Arc::new(FakeStore::with_apply_delay(Duration::from_millis(2)));
    for k in 0..KEYS {
        store.insert(&format!("key{k}"), "https://example.com");
    }
    let tracker = Arc::new(ClickTracker::new(
        store.clone(),
        Arc::new(NullCache::new()),
        test_settings(),
    ));

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let tracker = tracker.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    let (key, is_unique) = click(task, i);
                    tracker.record_click(&key, is_unique);
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }
    tracker.shutdown().await.unwrap();

    for batch in store.batches() {
        let mut keys: Vec<_> = batch.iter().map(|d| d.key.as_str()).collect();
        let len = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), len, "duplicate key in one batch");
    }
    assert!(!store.overlapped());
}
