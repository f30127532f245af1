//! # cache-switch
//!
//! A small key/value cache with one contract and three interchangeable
//! backends, chosen by configuration at startup.
//!
//! ## Features
//!
//! - **One contract:** `get` / `set` / `delete` / `exists` behave the same on every backend
//! - **In-memory:** bounded map with TTL expiry and LRU-biased eviction
//! - **File:** one file per key, survives restarts
//! - **Redis:** pooled connections, server-side expiry (feature `redis`, on by default)
//! - **Best-effort reads:** missing, expired, corrupt and unreachable all read as absent;
//!   only writes report failure
//!
//! ## Quick Start
//!
//! ```ignore
//! use cache_switch::CacheService;
//! use serde_json::json;
//!
//! // 1. Build once at startup from (partial) configuration
//! let cache = CacheService::from_overrides(json!({
//!     "type": "redis",
//!     "redis": { "host": "cache.internal", "max_connections": 20 }
//! }))
//! .await?;
//!
//! // 2. Hand clones to whoever needs it
//! let handle = cache.clone();
//!
//! // 3. Use it
//! handle.set("verify:alice@example.com", "482913", 300).await?;
//! if let Some(code) = handle.get("verify:alice@example.com").await {
//!     // ...
//! }
//! handle.delete("verify:alice@example.com").await;
//! ```
//!
//! ### Using a backend directly
//!
//! ```ignore
//! use cache_switch::backend::{CacheBackend, InMemoryBackend};
//!
//! let backend = InMemoryBackend::new(1000);
//! backend.set("key", b"value".to_vec(), 60).await?;
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod config;
pub mod error;
pub mod factory;
pub mod key;
pub mod observability;
pub mod serialization;
pub mod service;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use config::{CacheConfig, CacheType};
pub use error::{Error, Result};
pub use factory::{create_cache, Cache};
pub use service::CacheService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
