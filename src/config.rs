//! Cache configuration.
//!
//! A [`CacheConfig`] is always produced by deep-merging a caller's partial
//! overrides onto the fixed defaults, so a caller only spells out what
//! differs:
//!
//! ```
//! use cache_switch::config::{CacheConfig, CacheType};
//! use serde_json::json;
//!
//! let config = CacheConfig::from_overrides(json!({
//!     "type": "Redis",
//!     "redis": { "host": "10.0.0.5" }
//! })).unwrap();
//!
//! assert_eq!(config.cache_type, CacheType::Redis);
//! assert_eq!(config.redis.host, "10.0.0.5");
//! assert_eq!(config.redis.port, 6379);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of keys held by the in-memory backend.
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default Redis connection pool size.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default directory for the file backend.
pub const DEFAULT_FILE_PATH: &str = "storage/cache";

/// Which backend the factory builds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    #[default]
    Memory,
    Redis,
    File,
}

impl CacheType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::Memory => "memory",
            CacheType::Redis => "redis",
            CacheType::File => "file",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheType {
    type Err = Error;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheType::Memory),
            "redis" => Ok(CacheType::Redis),
            "file" => Ok(CacheType::File),
            _ => Err(Error::UnsupportedCacheType(s.to_string())),
        }
    }
}

/// In-memory backend options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Upper bound on stored keys before eviction kicks in.
    pub max_size: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

/// Redis backend options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: u32,
    pub password: Option<String>,
    /// Pool size.
    pub max_connections: u32,
    /// Only hand back values that are valid UTF-8.
    pub decode_responses: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            decode_responses: false,
        }
    }
}

impl RedisConfig {
    /// Build Redis connection string.
    ///
    /// The password is percent-encoded, so any character is safe in it.
    pub fn connection_string(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                urlencoding::encode(password),
                self.host,
                self.port,
                self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// File backend options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Directory holding one file per key.
    pub path: PathBuf,
}

impl Default for FileConfig {
    fn default() -> Self {
        FileConfig {
            path: PathBuf::from(DEFAULT_FILE_PATH),
        }
    }
}

/// Complete cache configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub cache_type: CacheType,
    pub memory: MemoryConfig,
    pub redis: RedisConfig,
    pub file: FileConfig,
}

impl CacheConfig {
    /// Merge `overrides` onto the defaults and validate the result.
    ///
    /// `overrides` may be `null` (pure defaults) or a JSON object shaped like
    /// `CacheConfig`. Unknown keys are ignored.
    ///
    /// # Errors
    /// - `Error::UnsupportedCacheType` if `type` names no known backend
    /// - `Error::ConfigError` if the overrides are not an object, a field has
    ///   the wrong shape, or a value is out of range
    pub fn from_overrides(overrides: Value) -> Result<Self> {
        let mut merged = serde_json::to_value(CacheConfig::default())?;

        match overrides {
            Value::Null => {}
            Value::Object(_) => deep_merge(&mut merged, overrides),
            other => {
                return Err(Error::ConfigError(format!(
                    "cache overrides must be an object, got {}",
                    other
                )))
            }
        }

        // Resolve the type before deserializing so an unknown name is
        // reported as such rather than as a generic parse failure.
        let cache_type = match merged.get("type") {
            Some(Value::String(name)) => name.parse::<CacheType>()?,
            Some(other) => return Err(Error::UnsupportedCacheType(other.to_string())),
            None => CacheType::default(),
        };
        merged["type"] = Value::String(cache_type.as_str().to_string());

        let config: CacheConfig = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document of overrides.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let overrides: Value = serde_json::from_str(json)?;
        Self::from_overrides(overrides)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` describing the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.memory.max_size == 0 {
            return Err(Error::ConfigError(
                "memory.max_size must be at least 1".to_string(),
            ));
        }
        if self.redis.max_connections == 0 {
            return Err(Error::ConfigError(
                "redis.max_connections must be at least 1".to_string(),
            ));
        }
        if self.file.path.as_os_str().is_empty() {
            return Err(Error::ConfigError("file.path must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Recursively merge `overrides` into `base`.
///
/// Objects present on both sides merge key by key. Anything else in
/// `overrides` (scalars, arrays, null) replaces the value in `base` outright.
pub fn deep_merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                let nested = value.is_object() && base_map.get(&key).is_some_and(Value::is_object);
                match base_map.get_mut(&key) {
                    Some(existing) if nested => deep_merge(existing, value),
                    _ => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}
