//! Generic in-memory cache with TTL expiry and LRU eviction.
//!
//! Every component in the pipeline uses an instance of [`TtlLruCache`] as its
//! memoization layer. Entries expire after a fixed TTL (checked at read time)
//! and are evicted strictly by access recency once the store reaches capacity.
//! Nothing is persisted; a restart starts cold.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use super::log_prefix;

/// A single cached value with its bookkeeping timestamps.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// When the entry was first created. Preserved across overwrites.
    inserted_at: Instant,
    /// When the entry was last written. TTL is measured from here, so every
    /// `put` of an existing key restarts its clock.
    refreshed_at: Instant,
}

/// Monotonic counters exposed through [`CacheStats`].
#[derive(Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expired: u64,
}

/// Interior state guarded by the cache's single mutex.
///
/// Invariant: `entries.len() == access_order.len()`, and every key in
/// `entries` appears exactly once in `access_order` (oldest-unused first).
#[derive(Debug)]
struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    access_order: VecDeque<String>,
    counters: Counters,
}

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a fresh value.
    pub hits: u64,
    /// Reads that found nothing usable (absent or expired).
    pub misses: u64,
    /// Entries removed to make room at capacity.
    pub evictions: u64,
    /// Entries removed because their TTL had elapsed at read time.
    pub expired: u64,
    /// Number of entries currently stored.
    pub size: usize,
    /// `hits / (hits + misses)`, or `0.0` before any read.
    pub hit_rate: f64,
}

/// Bounded key→value store with time-based expiry and LRU eviction.
///
/// All operations go through one internal [`Mutex`], so a shared reference is
/// enough to use the cache from multiple threads. Independent instances never
/// contend with each other.
///
/// Eviction is purely recency-based: when the store is full, the entry at the
/// least-recently-used end of the access queue goes, even if it has far more
/// TTL remaining than fresher entries.
pub struct TtlLruCache<V> {
    state: Mutex<CacheState<V>>,
    max_size: usize,
    ttl: Duration,
}

impl<V: Clone> TtlLruCache<V> {
    /// Create a cache holding at most `max_size` entries, each valid for `ttl`
    /// after its last write. `max_size` is clamped to a minimum of 1.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                access_order: VecDeque::new(),
                counters: Counters::default(),
            }),
            max_size: max_size.max(1),
            ttl,
        }
    }

    /// Look up `key`, returning a clone of the value if present and fresh.
    ///
    /// An expired entry counts as a miss: it is removed, and both the
    /// `expired` and `misses` counters increment. A fresh hit moves the key
    /// to the most-recently-used end of the access queue.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.lock();
        let now = Instant::now();

        let fresh = match state.entries.get(key) {
            Some(entry) => now.duration_since(entry.refreshed_at) < self.ttl,
            None => {
                state.counters.misses += 1;
                return None;
            }
        };

        if !fresh {
            debug!(key = %log_prefix(key), "cache entry expired, removing");
            state.entries.remove(key);
            Self::unlink(&mut state.access_order, key);
            state.counters.expired += 1;
            state.counters.misses += 1;
            return None;
        }

        Self::unlink(&mut state.access_order, key);
        state.access_order.push_back(key.to_string());
        state.counters.hits += 1;
        state.entries.get(key).map(|e| e.value.clone())
    }

    /// Insert or overwrite `key`.
    ///
    /// Overwrites unconditionally replace the value and restart the TTL clock
    /// (`refreshed_at = now`), keeping the original `inserted_at`. A brand-new
    /// key at capacity evicts the least-recently-used entry first.
    pub fn put(&self, key: &str, value: V) {
        let mut state = self.lock();
        let now = Instant::now();

        if state.entries.contains_key(key) {
            Self::unlink(&mut state.access_order, key);
        } else if state.entries.len() >= self.max_size {
            if let Some(oldest) = state.access_order.pop_front() {
                debug!(key = %log_prefix(&oldest), "evicting LRU cache entry");
                state.entries.remove(&oldest);
                state.counters.evictions += 1;
            }
        }

        let inserted_at = state
            .entries
            .get(key)
            .map(|e| e.inserted_at)
            .unwrap_or(now);
        state.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at,
                refreshed_at: now,
            },
        );
        state.access_order.push_back(key.to_string());
    }

    /// Drop every entry. Hit/miss/eviction counters are preserved.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.access_order.clear();
    }

    /// Snapshot the cache's counters and current size.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        let c = &state.counters;
        let total = c.hits + c.misses;
        CacheStats {
            hits: c.hits,
            misses: c.misses,
            evictions: c.evictions,
            expired: c.expired,
            size: state.entries.len(),
            hit_rate: if total > 0 {
                c.hits as f64 / total as f64
            } else {
                0.0
            },
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    // -- private helpers ---------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheState<V>> {
        // A poisoned lock means another thread panicked mid-operation; the
        // state is still structurally sound (no partial unsafe mutation), so
        // recover rather than cascade the panic.
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Remove `key`'s node from the access queue, wherever it sits.
    fn unlink(order: &mut VecDeque<String>, key: &str) {
        if let Some(pos) = order.iter().position(|k| k == key) {
            order.remove(pos);
        }
    }

    /// Test hook: age `key` by `age`, as if it had been written that long ago.
    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &str, age: Duration) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.get_mut(key) {
            entry.refreshed_at = entry
                .refreshed_at
                .checked_sub(age)
                .expect("monotonic clock too young to backdate");
            entry.inserted_at = entry.refreshed_at.min(entry.inserted_at);
        }
    }
}
