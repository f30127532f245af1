//! Backend selection.
//!
//! [`create_cache`] turns partial configuration into exactly one backend.
//! The result is a [`Cache`], a closed enum over the three backends that
//! itself implements [`CacheBackend`] by delegation.

use crate::backend::{CacheBackend, FileBackend, InMemoryBackend};
#[cfg(feature = "redis")]
use crate::backend::RedisBackend;
use crate::config::{CacheConfig, CacheType};
use crate::error::{Error, Result};
use serde_json::Value;

/// The backend chosen by configuration.
#[derive(Clone)]
pub enum Cache {
    Memory(InMemoryBackend),
    File(FileBackend),
    #[cfg(feature = "redis")]
    Redis(RedisBackend),
}

impl Cache {
    /// Build the backend named by `config.cache_type`.
    ///
    /// Allocates the storage handle only: an empty map, the cache directory,
    /// or an unconnected Redis pool.
    ///
    /// # Errors
    /// - `Error::ConfigError` if the config fails validation, or Redis is
    ///   selected without the `redis` feature
    /// - `Error::StorageFailure` if the file backend's directory cannot be created
    pub async fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let cache = match config.cache_type {
            CacheType::Memory => Cache::Memory(InMemoryBackend::new(config.memory.max_size)),
            CacheType::File => Cache::File(FileBackend::new(config.file.path.clone()).await?),
            #[cfg(feature = "redis")]
            CacheType::Redis => Cache::Redis(RedisBackend::new(config.redis.clone()).await?),
            #[cfg(not(feature = "redis"))]
            CacheType::Redis => {
                return Err(Error::ConfigError(
                    "redis cache selected but the `redis` feature is disabled".to_string(),
                ))
            }
        };

        info!("✓ Cache created: {}", cache.backend_type());
        Ok(cache)
    }

    pub fn as_memory(&self) -> Option<&InMemoryBackend> {
        match self {
            Cache::Memory(backend) => Some(backend),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileBackend> {
        match self {
            Cache::File(backend) => Some(backend),
            _ => None,
        }
    }

    #[cfg(feature = "redis")]
    pub fn as_redis(&self) -> Option<&RedisBackend> {
        match self {
            Cache::Redis(backend) => Some(backend),
            _ => None,
        }
    }
}

/// Merge `overrides` onto the default configuration and build the backend.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cache_switch::Result<()> {
/// use cache_switch::create_cache;
/// use serde_json::json;
///
/// let cache = create_cache(json!({ "type": "memory", "memory": { "max_size": 5 } })).await?;
/// assert_eq!(cache.as_memory().map(|m| m.max_size()), Some(5));
/// # Ok(())
/// # }
/// ```
///
/// # Errors
/// - `Error::UnsupportedCacheType` for an unknown `type`; nothing is built
/// - see [`CacheConfig::from_overrides`] and [`Cache::from_config`]
pub async fn create_cache(overrides: Value) -> Result<Cache> {
    let config = CacheConfig::from_overrides(overrides).map_err(|e| {
        if let Error::UnsupportedCacheType(name) = &e {
            error!("Refusing to build cache of unsupported type {:?}", name);
        }
        e
    })?;
    Cache::from_config(&config).await
}

impl CacheBackend for Cache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self {
            Cache::Memory(backend) => backend.get(key).await,
            Cache::File(backend) => backend.get(key).await,
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: i64) -> Result<()> {
        match self {
            Cache::Memory(backend) => backend.set(key, value, ttl_seconds).await,
            Cache::File(backend) => backend.set(key, value, ttl_seconds).await,
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.set(key, value, ttl_seconds).await,
        }
    }

    async fn delete(&self, key: &str) {
        match self {
            Cache::Memory(backend) => backend.delete(key).await,
            Cache::File(backend) => backend.delete(key).await,
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.delete(key).await,
        }
    }

    async fn exists(&self, key: &str) -> bool {
        match self {
            Cache::Memory(backend) => backend.exists(key).await,
            Cache::File(backend) => backend.exists(key).await,
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.exists(key).await,
        }
    }

    async fn expire(&self, key: &str, ttl_seconds: i64) -> bool {
        match self {
            Cache::Memory(backend) => backend.expire(key, ttl_seconds).await,
            Cache::File(backend) => backend.expire(key, ttl_seconds).await,
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.expire(key, ttl_seconds).await,
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        match self {
            Cache::Memory(backend) => backend.ttl(key).await,
            Cache::File(backend) => backend.ttl(key).await,
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.ttl(key).await,
        }
    }

    fn backend_type(&self) -> &'static str {
        match self {
            Cache::Memory(backend) => backend.backend_type(),
            Cache::File(backend) => backend.backend_type(),
            #[cfg(feature = "redis")]
            Cache::Redis(backend) => backend.backend_type(),
        }
    }
}
