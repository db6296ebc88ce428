//! In-process TTL cache
//!
//! Entries expire a fixed time after they were inserted. Expiry is checked
//! lazily on every read; the background sweep only reclaims memory.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};

/// Configuration for the cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time an entry stays fresh after insertion
    pub ttl: Duration,
    /// Maximum number of entries (0 = unbounded)
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::minutes(5),
            max_entries: 10_000,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

struct CacheEntry<V> {
    value: V,
    inserted_at: DateTime<Utc>,
    seq: u64,
}

struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Keys in insertion order, tagged with the sequence number of the write.
    /// Tags that no longer match the live entry are skipped.
    order: VecDeque<(String, u64)>,
    next_seq: u64,
    hit_count: u64,
    miss_count: u64,
}

impl<V> Inner<V> {
    fn is_live(&self, key: &str, seq: u64) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.seq == seq)
    }

    /// Remove the least recently inserted entry
    fn evict_oldest(&mut self) -> Option<String> {
        while let Some((key, seq)) = self.order.pop_front() {
            if self.is_live(&key, seq) {
                self.entries.remove(&key);
                return Some(key);
            }
        }
        None
    }

    /// Drop stale order tags once they outnumber live entries
    fn compact_order(&mut self) {
        if self.order.len() > 2 * self.entries.len() + 32 {
            let entries = &self.entries;
            self.order
                .retain(|(key, seq)| entries.get(key).is_some_and(|entry| entry.seq == *seq));
        }
    }
}

/// Thread-safe map with absolute per-entry expiry
///
/// The lock is only held for map operations and never across an await.
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a new cache on the wall clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new cache on the given clock
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        info!(
            "Initializing cache (ttl: {}s, max_entries: {})",
            config.ttl.num_seconds(),
            config.max_entries
        );

        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                next_seq: 0,
                hit_count: 0,
                miss_count: 0,
            }),
            config,
            clock,
        }
    }

    /// Current time according to the cache's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// Look up a fresh entry
    ///
    /// An entry whose age has reached the TTL is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_if(key, |_| true)
    }

    /// Look up a fresh entry that `keep` accepts
    ///
    /// A stale or rejected entry is removed and counted as a single miss.
    pub fn get_if(&self, key: &str, keep: impl FnOnce(&V) -> bool) -> Option<V> {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut inner = self.inner.lock();

        let state = inner.entries.get(key).map(|entry| {
            (now - entry.inserted_at < ttl && keep(&entry.value)).then(|| entry.value.clone())
        });

        match state {
            Some(Some(value)) => {
                inner.hit_count += 1;
                Some(value)
            }
            Some(None) => {
                inner.entries.remove(key);
                inner.miss_count += 1;
                None
            }
            None => {
                inner.miss_count += 1;
                None
            }
        }
    }

    /// Insert or overwrite an entry
    ///
    /// When the cache is full the least recently inserted entry is evicted.
    /// Entries expire in insertion order, so expired entries always go first.
    pub fn insert(&self, key: String, value: V) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let max = self.config.max_entries;
        if max > 0 && !inner.entries.contains_key(&key) && inner.entries.len() >= max {
            if let Some(evicted) = inner.evict_oldest() {
                debug!("Evicting oldest cache entry: {}", evicted);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.order.push_back((key.clone(), seq));
        inner.entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                seq,
            },
        );
        inner.compact_order();
    }

    /// Remove an entry, returning whether one was present
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.lock().entries.remove(key).is_some()
    }

    /// Number of stored entries, including ones not yet swept
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.config.ttl;
        let mut inner = self.inner.lock();

        let before = inner.entries.len();
        inner.entries.retain(|_, entry| now - entry.inserted_at < ttl);
        inner.compact_order();
        before - inner.entries.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            entry_count: inner.entries.len(),
            hit_count: inner.hit_count,
            miss_count: inner.miss_count,
        }
    }
}

/// Spawn a background task that sweeps expired entries periodically
pub fn spawn_cleanup_task<V>(
    cache: Arc<TtlCache<V>>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    info!(
        "Starting background cache cleanup task (interval: {}s)",
        interval.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        // Skip the first tick (which fires immediately)
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let purged = cache.purge_expired();
            let stats = cache.stats();
            debug!(
                "Cache sweep removed {} expired entries ({} live, {} hits, {} misses)",
                purged, stats.entry_count, stats.hit_count, stats.miss_count
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn cache(max_entries: usize) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let config = CacheConfig {
            ttl: Duration::minutes(5),
            max_entries,
        };
        (TtlCache::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn test_get_within_ttl() {
        let (cache, clock) = cache(0);
        cache.insert("k".into(), "v".into());

        clock.set(t0() + Duration::minutes(5) - Duration::seconds(1));
        assert_eq!(cache.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_get_after_ttl_is_miss() {
        let (cache, clock) = cache(0);
        cache.insert("k".into(), "v".into());

        clock.set(t0() + Duration::minutes(5));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "stale entry should be dropped on read");

        cache.insert("k".into(), "v".into());
        clock.advance(Duration::minutes(5) + Duration::seconds(1));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_overwrite_refreshes_insertion_time() {
        let (cache, clock) = cache(0);
        cache.insert("k".into(), "old".into());

        clock.advance(Duration::minutes(4));
        cache.insert("k".into(), "new".into());

        clock.advance(Duration::minutes(4));
        assert_eq!(cache.get("k").as_deref(), Some("new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate() {
        let (cache, _clock) = cache(0);
        cache.insert("a".into(), "1".into());
        cache.insert("b".into(), "2".into());

        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = cache(0);
        cache.insert("old".into(), "1".into());
        clock.advance(Duration::minutes(3));
        cache.insert("new".into(), "2".into());

        clock.advance(Duration::minutes(3));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("new").as_deref(), Some("2"));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (cache, clock) = cache(2);
        cache.insert("a".into(), "1".into());
        clock.advance(Duration::seconds(1));
        cache.insert("b".into(), "2".into());
        clock.advance(Duration::seconds(1));
        cache.insert("c".into(), "3".into());

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b").as_deref(), Some("2"));
        assert_eq!(cache.get("c").as_deref(), Some("3"));

        // Overwriting an existing key never evicts
        cache.insert("b".into(), "22".into());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("c").as_deref(), Some("3"));
    }

    #[test]
    fn test_capacity_prefers_expired_entries() {
        let (cache, clock) = cache(2);
        cache.insert("stale".into(), "1".into());
        clock.advance(Duration::minutes(4));
        cache.insert("fresh".into(), "2".into());
        clock.advance(Duration::minutes(2));

        cache.insert("newest".into(), "3".into());
        assert_eq!(cache.get("fresh").as_deref(), Some("2"));
        assert_eq!(cache.get("newest").as_deref(), Some("3"));
    }

    #[test]
    fn test_rejected_entry_counts_as_one_miss() {
        let (cache, _clock) = cache(0);
        cache.insert("k".into(), "v".into());

        assert_eq!(cache.get_if("k", |v| v != "v"), None);
        assert!(cache.is_empty());
        assert_eq!(
            cache.stats(),
            CacheStats {
                entry_count: 0,
                hit_count: 0,
                miss_count: 1,
            }
        );
    }

    #[test]
    fn test_eviction_skips_overwritten_and_invalidated_keys() {
        let (cache, clock) = cache(3);
        cache.insert("a".into(), "1".into());
        clock.advance(Duration::seconds(1));
        cache.insert("b".into(), "2".into());
        clock.advance(Duration::seconds(1));
        cache.insert("c".into(), "3".into());

        // "a" is now the newest write, "b" is gone
        cache.insert("a".into(), "11".into());
        cache.invalidate("b");
        cache.insert("d".into(), "4".into());
        assert_eq!(cache.len(), 3);

        cache.insert("e".into(), "5".into());
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get("c"), None);
        assert_eq!(cache.get("a").as_deref(), Some("11"));
        assert_eq!(cache.get("d").as_deref(), Some("4"));
        assert_eq!(cache.get("e").as_deref(), Some("5"));
    }

    #[test]
    fn test_order_queue_stays_bounded_under_overwrites() {
        let (cache, _clock) = cache(4);
        for i in 0..1_000 {
            cache.insert(format!("k{}", i % 4), i.to_string());
        }

        assert_eq!(cache.len(), 4);
        assert!(cache.inner.lock().order.len() <= 2 * 4 + 33);
    }

    #[test]
    fn test_stats() {
        let (cache, _clock) = cache(0);
        cache.insert("k".into(), "v".into());
        cache.get("k");
        cache.get("k");
        cache.get("missing");

        assert_eq!(
            cache.stats(),
            CacheStats {
                entry_count: 1,
                hit_count: 2,
                miss_count: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_access() {
        let cache = TtlCache::<usize>::new(CacheConfig::default());

        std::thread::scope(|s| {
            for t in 0..8 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..500 {
                        let key = format!("k{}", i % 50);
                        cache.insert(key.clone(), t);
                        assert!(cache.get(&key).is_some());
                    }
                });
            }
        });

        assert_eq!(cache.len(), 50);
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps_expired_entries() {
        let (cache, clock) = cache(0);
        let cache = Arc::new(cache);
        cache.insert("k".into(), "v".into());
        clock.advance(Duration::minutes(10));

        let handle = spawn_cleanup_task(cache.clone(), std::time::Duration::from_millis(10));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        handle.abort();

        assert!(cache.is_empty());
    }
}
