//! Cache backend implementations.

use crate::error::Result;

pub mod file;
pub mod inmemory;
#[cfg(feature = "redis")]
pub mod redis;

pub use file::FileBackend;
pub use inmemory::{CacheStats, InMemoryBackend};
#[cfg(feature = "redis")]
pub use redis::{PoolStats, RedisBackend};

/// The contract every storage medium implements.
///
/// Only `set` can fail. The read paths report a missing, expired, corrupt or
/// (for Redis) unreachable entry as plain absence, so callers treat the cache
/// as best-effort and never branch on why a value is missing.
///
/// **IMPORTANT:** All methods take `&self`. Backends use interior mutability
/// and clones share one underlying store.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync + Clone {
    /// Retrieve the value stored under `key`.
    ///
    /// Returns `None` for a blank key, a missing or expired entry, or a
    /// storage error.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key` for `ttl_seconds`.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` for a blank key or `ttl_seconds <= 0`,
    ///   raised before touching storage
    /// - `Error::StorageFailure` when the medium rejects the write
    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: i64) -> Result<()>;

    /// Remove `key`. Absent keys, blank keys and storage errors are ignored.
    async fn delete(&self, key: &str);

    /// Whether `key` holds an unexpired value.
    async fn exists(&self, key: &str) -> bool;

    /// Give an existing, unexpired `key` a new lifetime of `ttl_seconds`.
    ///
    /// Returns `false` for an absent key, a blank key, `ttl_seconds <= 0`, or
    /// a storage error. Never creates an entry.
    async fn expire(&self, key: &str, ttl_seconds: i64) -> bool;

    /// Seconds left before `key` expires.
    ///
    /// Returns [`TTL_MISSING`](crate::key::TTL_MISSING) (`-2`) for an absent
    /// or blank key and on storage errors, and
    /// [`TTL_PERSISTENT`](crate::key::TTL_PERSISTENT) (`-1`) for a key
    /// without an expiry.
    async fn ttl(&self, key: &str) -> i64;

    /// Short name used in logs.
    fn backend_type(&self) -> &'static str;
}
