//! Error types for the cache layer.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cache layer.
///
/// Only writes and construction can fail. Read paths (`get`, `exists`,
/// `delete`) never surface an error: a missing, expired or unreadable entry
/// is reported as absent.
#[derive(Debug, Clone)]
pub enum Error {
    /// The caller passed an argument the cache cannot accept.
    ///
    /// Raised before any I/O when:
    /// - the key is empty or whitespace only
    /// - the TTL is zero or negative
    ///
    /// **Recovery:** None. This is a caller bug and is never retried.
    InvalidArgument(String),

    /// The backend could not persist a write.
    ///
    /// Common causes:
    /// - Redis connection lost or pool exhausted
    /// - Disk full or cache directory not writable
    ///
    /// The in-memory backend never returns this.
    ///
    /// **Recovery:** Left to the caller. No retry happens inside the cache.
    StorageFailure(String),

    /// The factory was asked for a backend type it does not know.
    UnsupportedCacheType(String),

    /// Configuration could not be merged, parsed or validated.
    ConfigError(String),

    /// A typed value could not be encoded.
    SerializationError(String),

    /// Stored bytes could not be decoded into the requested type.
    DeserializationError(String),

    /// The envelope header of a stored value is not ours.
    InvalidCacheEntry(String),

    /// The stored value was written by an incompatible schema version.
    VersionMismatch {
        /// Expected schema version (from compiled code)
        expected: u32,
        /// Found schema version (from cached entry)
        found: u32,
    },

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Error::StorageFailure(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::StorageFailure(msg) => write!(f, "Storage failure: {}", msg),
            Error::UnsupportedCacheType(name) => {
                write!(
                    f,
                    "Unsupported cache type: {} (expected one of memory, redis, file)",
                    name
                )
            }
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::InvalidCacheEntry(msg) => write!(f, "Invalid cache entry: {}", msg),
            Error::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Cache version mismatch: expected {}, found {}",
                    expected, found
                )
            }
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::StorageFailure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidArgument("empty key".to_string());
        assert_eq!(err.to_string(), "Invalid argument: empty key");
    }

    #[test]
    fn test_unsupported_type_display_lists_choices() {
        let err = Error::UnsupportedCacheType("memcached".to_string());
        assert!(err.to_string().contains("memcached"));
        assert!(err.to_string().contains("memory, redis, file"));
    }

    #[test]
    fn test_io_error_is_storage_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io.into();
        assert!(err.is_storage_failure());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_error_from_string() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
    }
}
