//! The process-wide cache handle.
//!
//! Build one [`CacheService`] at startup from configuration and hand clones
//! to whatever needs the cache (request handlers, workers, the
//! verification-code flow). Clones share the same backend. There is no
//! global instance: tests simply build their own.

use crate::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::factory::Cache;
use crate::key::validate_set;
use crate::observability::{CacheMetrics, LogMetrics};
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Shared handle over the configured backend.
///
/// # Example
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cache_switch::Result<()> {
/// use cache_switch::CacheService;
/// use serde_json::json;
///
/// // At startup
/// let cache = CacheService::from_overrides(json!({ "type": "memory" })).await?;
///
/// // In a handler (clone is cheap)
/// let handle = cache.clone();
/// handle.set("verify:alice@example.com", "482913", 300).await?;
/// assert_eq!(
///     cache.get("verify:alice@example.com").await.as_deref(),
///     Some(&b"482913"[..])
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheService {
    cache: Arc<Cache>,
    metrics: Arc<dyn CacheMetrics>,
}

impl CacheService {
    /// Wrap an already built backend; operations are reported to the log.
    pub fn new(cache: Cache) -> Self {
        Self::with_metrics(cache, Arc::new(LogMetrics))
    }

    /// Wrap a backend with custom metrics.
    pub fn with_metrics(cache: Cache, metrics: Arc<dyn CacheMetrics>) -> Self {
        CacheService {
            cache: Arc::new(cache),
            metrics,
        }
    }

    /// Build the backend described by `config`.
    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::new(Cache::from_config(config).await?))
    }

    /// Merge `overrides` onto the defaults and build the backend.
    pub async fn from_overrides(overrides: Value) -> Result<Self> {
        let config = CacheConfig::from_overrides(overrides)?;
        Self::from_config(&config).await
    }

    /// The selected backend.
    pub fn backend(&self) -> &Cache {
        &self.cache
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let start = Instant::now();
        let value = self.cache.get(key).await;

        match value {
            Some(_) => self.metrics.record_hit(key, start.elapsed()),
            None => self.metrics.record_miss(key, start.elapsed()),
        }
        value
    }

    /// Store raw bytes for `ttl_seconds`.
    ///
    /// # Errors
    /// `Error::InvalidArgument` or `Error::StorageFailure`, see
    /// [`CacheBackend::set`].
    pub async fn set(&self, key: &str, value: impl Into<Vec<u8>>, ttl_seconds: i64) -> Result<()> {
        let start = Instant::now();
        match self.cache.set(key, value.into(), ttl_seconds).await {
            Ok(()) => {
                self.metrics.record_set(key, start.elapsed());
                Ok(())
            }
            Err(e) => {
                self.metrics.record_error(key, &e.to_string());
                Err(e)
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        let start = Instant::now();
        self.cache.delete(key).await;
        self.metrics.record_delete(key, start.elapsed());
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.cache.exists(key).await
    }

    /// Give an existing key a new lifetime. `false` if nothing was updated.
    pub async fn expire(&self, key: &str, ttl_seconds: i64) -> bool {
        self.cache.expire(key, ttl_seconds).await
    }

    /// Seconds until `key` expires; `-2` when absent.
    pub async fn ttl(&self, key: &str) -> i64 {
        self.cache.ttl(key).await
    }

    /// Fetch and decode a value stored with [`set_as`](Self::set_as).
    ///
    /// A value that no longer decodes (another type, older schema) is
    /// deleted and reported as absent.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key).await?;
        match deserialize_from_cache::<T>(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Dropping undecodable cache entry {}: {}", key, e);
                self.cache.delete(key).await;
                None
            }
        }
    }

    /// Encode `value` and store it for `ttl_seconds`.
    ///
    /// # Errors
    /// - `Error::InvalidArgument` for a blank key or non-positive TTL
    /// - `Error::SerializationError` if `value` cannot be encoded
    /// - `Error::StorageFailure` if the backend rejects the write
    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: i64) -> Result<()> {
        validate_set(key, ttl_seconds)?;
        let bytes = serialize_for_cache(value)?;
        self.set(key, bytes, ttl_seconds).await
    }
}
