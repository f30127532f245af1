//! In-memory cache backend (default, bounded, thread-safe).
//!
//! A single mutex guards the whole map: eviction scans and rewrites the map,
//! so every operation runs as one read-modify-write critical section.
//! Expired entries are dropped lazily when they are next looked up, or in bulk
//! through [`InMemoryBackend::purge_expired`].

use super::CacheBackend;
use crate::config::DEFAULT_MAX_SIZE;
use crate::error::Result;
use crate::key::{
    is_valid_key, remaining_secs, validate_set, validate_ttl, MAX_TTL_SECS, TTL_MISSING,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// In-memory cache entry.
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Instant,
    last_access: Instant,
    /// Bumped on every write or read hit; breaks `last_access` ties.
    touched: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// `now + ttl`, saturating at the longest supported lifetime.
fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(Duration::from_secs(MAX_TTL_SECS as u64)))
        .unwrap_or(now)
}

#[derive(Default)]
struct Store {
    entries: HashMap<String, CacheEntry>,
    clock: u64,
}

impl Store {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Remove `key` if it has expired. Returns whether a live entry remains.
    fn check_live(&mut self, key: &str, now: Instant) -> bool {
        let expired = match self.entries.get(key) {
            None => return false,
            Some(entry) => entry.is_expired(now),
        };
        if expired {
            self.entries.remove(key);
        }
        !expired
    }

    /// Evict least recently accessed entries once the map outgrows `max_size`.
    ///
    /// Trims an extra 10% of `max_size` so the next few inserts do not each
    /// pay for another scan.
    fn evict_if_needed(&mut self, max_size: usize) -> usize {
        let len = self.entries.len();
        if len <= max_size {
            return 0;
        }

        let evict_count = (len - max_size + max_size / 10).min(len);

        let mut by_age: Vec<(Instant, u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.last_access, entry.touched, key.clone()))
            .collect();
        by_age.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        for (_, _, key) in by_age.into_iter().take(evict_count) {
            self.entries.remove(&key);
        }

        evict_count
    }
}

/// Bounded in-memory cache with TTL expiry and LRU-biased eviction.
///
/// Clones share the same store.
///
/// # Example
///
/// ```no_run
/// use cache_switch::backend::{CacheBackend, InMemoryBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new(1000);
///
///     backend.set("verify:alice", b"482913".to_vec(), 300).await?;
///     assert_eq!(backend.get("verify:alice").await, Some(b"482913".to_vec()));
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<Mutex<Store>>,
    max_size: usize,
}

impl InMemoryBackend {
    /// Create an empty backend holding at most `max_size` keys.
    ///
    /// A `max_size` of zero is treated as one.
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        info!("✓ InMemory backend initialized (max size: {})", max_size);

        InMemoryBackend {
            store: Arc::new(Mutex::new(Store::default())),
            max_size,
        }
    }

    // Every statement leaves the map consistent, so a panic elsewhere while
    // the lock was held does not invalidate it.
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every expired entry in one pass. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.lock();
        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - store.entries.len();

        if removed > 0 {
            debug!("✓ InMemory PURGE removed {} expired entries", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let store = self.lock();

        CacheStats {
            total_entries: store.entries.len(),
            expired_entries: store.entries.values().filter(|e| e.is_expired(now)).count(),
            total_bytes: store.entries.values().map(|e| e.data.len()).sum(),
            max_size: self.max_size,
        }
    }

    /// Print cache statistics to debug log.
    pub fn log_stats(&self) {
        let stats = self.stats();
        debug!(
            "Cache Stats: {}/{} entries ({} expired), {} bytes",
            stats.total_entries, stats.max_size, stats.expired_entries, stats.total_bytes
        );
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let mut store = self.lock();

        if !store.check_live(key, now) {
            debug!("✓ InMemory GET {} -> MISS", key);
            return None;
        }

        let touched = store.tick();
        let entry = store.entries.get_mut(key)?;
        entry.last_access = now;
        entry.touched = touched;

        debug!("✓ InMemory GET {} -> HIT", key);
        Some(entry.data.clone())
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: i64) -> Result<()> {
        let ttl: Duration = validate_set(key, ttl_seconds)?;

        let now = Instant::now();
        let mut store = self.lock();
        let touched = store.tick();
        store.entries.insert(
            key.to_string(),
            CacheEntry {
                data: value,
                expires_at: deadline(now, ttl),
                last_access: now,
                touched,
            },
        );

        let evicted = store.evict_if_needed(self.max_size);
        if evicted > 0 {
            warn!(
                "InMemory cache over capacity ({}), evicted {} least recently used entries",
                self.max_size, evicted
            );
        }

        debug!("✓ InMemory SET {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) {
        if !is_valid_key(key) {
            return;
        }
        self.lock().entries.remove(key);
        debug!("✓ InMemory DELETE {}", key);
    }

    async fn exists(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock().check_live(key, now)
    }

    async fn expire(&self, key: &str, ttl_seconds: i64) -> bool {
        if !is_valid_key(key) {
            return false;
        }
        let ttl = match validate_ttl(ttl_seconds) {
            Ok(ttl) => ttl,
            Err(_) => return false,
        };

        let now = Instant::now();
        let mut store = self.lock();
        if !store.check_live(key, now) {
            return false;
        }
        match store.entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = deadline(now, ttl);
                debug!("✓ InMemory EXPIRE {} (TTL: {}s)", key, ttl_seconds);
                true
            }
            None => false,
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        let now = Instant::now();
        let mut store = self.lock();
        if !store.check_live(key, now) {
            return TTL_MISSING;
        }
        store
            .entries
            .get(key)
            .map(|entry| remaining_secs(entry.expires_at.saturating_duration_since(now)))
            .unwrap_or(TTL_MISSING)
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

/// Cache statistics.
#[derive(Clone, Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub total_bytes: usize,
    pub max_size: usize,
}
