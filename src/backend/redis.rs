//! Redis cache backend implementation.
//!
//! A thin adapter over GET / SET EX / DEL / EXISTS on a pooled connection.
//! Only `set` reports transport failures; `get`, `exists` and `delete` log
//! them and behave as if the key were absent.

use super::CacheBackend;
use crate::config::RedisConfig;
use crate::error::{Error, Result};
use crate::key::{is_valid_key, validate_set, validate_ttl, TTL_MISSING};
use deadpool_redis::{redis::AsyncCommands, Config as PoolConfig, Connection, Pool, Runtime};
use std::sync::Arc;
use tokio::sync::Mutex;

fn command_error(command: &str, e: impl std::fmt::Display) -> Error {
    Error::StorageFailure(format!("Redis {} failed: {}", command, e))
}

/// Pool statistics information.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub connections: u32,
    pub idle_connections: u32,
    pub max_connections: u32,
}

/// Redis backend with connection pooling.
///
/// Every operation holds one backend-wide async mutex from validation to
/// reply, which serialises all cache traffic of the process through this
/// instance.
///
/// # Example
///
/// ```no_run
/// # use cache_switch::backend::{CacheBackend, RedisBackend};
/// # use cache_switch::config::RedisConfig;
/// # async fn example() -> cache_switch::Result<()> {
/// let backend = RedisBackend::new(RedisConfig::default()).await?;
///
/// backend.set("verify:alice", b"482913".to_vec(), 300).await?;
/// let code = backend.get("verify:alice").await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool,
    lock: Arc<Mutex<()>>,
    decode_responses: bool,
    max_connections: u32,
}

impl RedisBackend {
    /// Create a backend from configuration.
    ///
    /// Builds the pool only; connections are opened on first use, so an
    /// unreachable server is not detected here.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if the pool cannot be created from the
    /// configuration.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = PoolConfig::from_url(config.connection_string());
        cfg.pool = Some(deadpool_redis::PoolConfig::new(
            config.max_connections as usize,
        ));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create Redis pool: {}", e)))?;

        info!(
            "✓ Redis backend initialized: {}:{}/{} (pool size: {})",
            config.host, config.port, config.db, config.max_connections
        );

        Ok(RedisBackend {
            pool,
            lock: Arc::new(Mutex::new(())),
            decode_responses: config.decode_responses,
            max_connections: config.max_connections,
        })
    }

    async fn connection(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| Error::StorageFailure(format!("Failed to get Redis connection: {}", e)))
    }

    /// Get current pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        let status = self.pool.status();
        PoolStats {
            connections: status.size as u32,
            idle_connections: status.available as u32,
            max_connections: self.max_connections,
        }
    }

    /// PING the server. Any failure reads as unhealthy.
    pub async fn health_check(&self) -> bool {
        match self.ping().await {
            Ok(pong) => pong.contains("PONG"),
            Err(e) => {
                warn!("Redis health check failed: {}", e);
                false
            }
        }
    }

    async fn ping(&self) -> Result<String> {
        let mut conn = self.connection().await?;
        deadpool_redis::redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| command_error("PING", e))
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(|e| command_error("GET", e))
    }

    async fn store(&self, key: &str, value: Vec<u8>, seconds: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(|e| command_error("SET EX", e))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|e| command_error("DEL", e))
    }

    async fn set_expiry(&self, key: &str, seconds: i64) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.expire(key, seconds)
            .await
            .map_err(|e| command_error("EXPIRE", e))
    }

    async fn remaining(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        conn.ttl(key).await.map_err(|e| command_error("TTL", e))
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        conn.exists(key)
            .await
            .map_err(|e| command_error("EXISTS", e))
    }
}

impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        if !is_valid_key(key) {
            return None;
        }

        let _guard = self.lock.lock().await;
        match self.fetch(key).await {
            Ok(Some(value)) => {
                if self.decode_responses && std::str::from_utf8(&value).is_err() {
                    warn!("Redis GET {} -> value is not valid UTF-8, treating as miss", key);
                    return None;
                }
                debug!("✓ Redis GET {} -> HIT", key);
                Some(value)
            }
            Ok(None) => {
                debug!("✓ Redis GET {} -> MISS", key);
                None
            }
            Err(e) => {
                warn!("Redis GET {} failed, treating as miss: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: i64) -> Result<()> {
        let ttl = validate_set(key, ttl_seconds)?;

        let _guard = self.lock.lock().await;
        self.store(key, value, ttl.as_secs()).await.map_err(|e| {
            error!("Redis SET failed for key {}: {}", key, e);
            e
        })?;

        debug!("✓ Redis SET {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) {
        if !is_valid_key(key) {
            return;
        }

        let _guard = self.lock.lock().await;
        match self.remove(key).await {
            Ok(()) => debug!("✓ Redis DELETE {}", key),
            Err(e) => warn!("Redis DELETE {} failed, ignoring: {}", key, e),
        }
    }

    async fn exists(&self, key: &str) -> bool {
        if !is_valid_key(key) {
            return false;
        }

        let _guard = self.lock.lock().await;
        match self.contains(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("Redis EXISTS {} failed, treating as absent: {}", key, e);
                false
            }
        }
    }

    async fn expire(&self, key: &str, ttl_seconds: i64) -> bool {
        if !is_valid_key(key) {
            return false;
        }
        let ttl = match validate_ttl(ttl_seconds) {
            Ok(ttl) => ttl,
            Err(_) => return false,
        };

        let _guard = self.lock.lock().await;
        match self.set_expiry(key, ttl.as_secs() as i64).await {
            Ok(updated) => {
                debug!("✓ Redis EXPIRE {} (TTL: {}s) -> {}", key, ttl_seconds, updated);
                updated
            }
            Err(e) => {
                warn!("Redis EXPIRE {} failed, ignoring: {}", key, e);
                false
            }
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        if !is_valid_key(key) {
            return TTL_MISSING;
        }

        let _guard = self.lock.lock().await;
        match self.remaining(key).await {
            Ok(seconds) => seconds,
            Err(e) => {
                warn!("Redis TTL {} failed, treating as absent: {}", key, e);
                TTL_MISSING
            }
        }
    }

    fn backend_type(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Nothing listens on port 1, so every connection attempt is refused.
    fn unreachable_config() -> RedisConfig {
        RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            max_connections: 2,
            ..RedisConfig::default()
        }
    }

    #[tokio::test]
    async fn test_redis_backend_new_does_not_connect() {
        let backend = RedisBackend::new(unreachable_config())
            .await
            .expect("Pool creation should not need a server");

        let stats = backend.pool_stats();
        assert_eq!(stats.connections, 0);
        assert_eq!(stats.max_connections, 2);
    }

    #[tokio::test]
    async fn test_redis_backend_read_paths_swallow_transport_errors() {
        let backend = RedisBackend::new(unreachable_config()).await.unwrap();

        assert_eq!(backend.get("key").await, None);
        assert!(!backend.exists("key").await);
        backend.delete("key").await;
        assert!(!backend.expire("key", 30).await);
        assert_eq!(backend.ttl("key").await, TTL_MISSING);
        assert!(!backend.health_check().await);
    }

    #[tokio::test]
    async fn test_redis_backend_set_surfaces_storage_failure() {
        let backend = RedisBackend::new(unreachable_config()).await.unwrap();

        let err = backend.set("key", b"v".to_vec(), 10).await.unwrap_err();
        assert!(err.is_storage_failure());
    }

    #[tokio::test]
    async fn test_redis_backend_validates_before_io() {
        let backend = RedisBackend::new(unreachable_config()).await.unwrap();

        assert!(backend.set("key", vec![], 0).await.unwrap_err().is_invalid_argument());
        assert!(backend.set("", vec![], 10).await.unwrap_err().is_invalid_argument());
        assert!(!backend.expire("key", 0).await);
        assert!(!backend.expire(" ", 10).await);
        assert_eq!(backend.ttl("").await, TTL_MISSING);
        assert_eq!(backend.pool_stats().connections, 0);
    }

    // Integration tests - require running Redis server
    // Run with: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_redis_backend_roundtrip() {
        let backend = RedisBackend::new(RedisConfig::default()).await.unwrap();

        backend
            .set("unit_roundtrip", b"value".to_vec(), 30)
            .await
            .expect("Failed to set");
        assert_eq!(backend.get("unit_roundtrip").await, Some(b"value".to_vec()));
        assert!(backend.exists("unit_roundtrip").await);

        backend.delete("unit_roundtrip").await;
        assert_eq!(backend.get("unit_roundtrip").await, None);
    }

    #[tokio::test]
    #[ignore]
    async fn test_redis_backend_decode_responses_rejects_binary() {
        let config = RedisConfig {
            decode_responses: true,
            ..RedisConfig::default()
        };
        let backend = RedisBackend::new(config).await.unwrap();

        backend.set("unit_binary", vec![0xff, 0xfe], 30).await.unwrap();
        assert_eq!(backend.get("unit_binary").await, None);

        backend.set("unit_text", b"hello".to_vec(), 30).await.unwrap();
        assert_eq!(backend.get("unit_text").await, Some(b"hello".to_vec()));

        backend.delete("unit_binary").await;
        backend.delete("unit_text").await;
    }
}
