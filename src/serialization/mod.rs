//! Postcard encoding with a versioned envelope.
//!
//! Typed values stored through [`CacheService::set_as`](crate::CacheService::set_as)
//! and every record written by the file backend use this layout:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│ VERSION (varint)│ POSTCARD PAYLOAD         │
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "CSWT"              u32                postcard::to_allocvec(T)
//! ```
//!
//! The format only has to survive a write/read round trip within one
//! deployment. Bumping [`CURRENT_SCHEMA_VERSION`] makes every older entry
//! read as absent.
//!
//! ```rust
//! use cache_switch::serialization::{deserialize_from_cache, serialize_for_cache};
//!
//! # fn main() -> cache_switch::Result<()> {
//! let bytes = serialize_for_cache(&("otp", 482913u32))?;
//! let (kind, code): (String, u32) = deserialize_from_cache(&bytes)?;
//! assert_eq!(kind, "otp");
//! assert_eq!(code, 482913);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Magic header identifying our entries: b"CSWT"
pub const CACHE_MAGIC: [u8; 4] = *b"CSWT";

/// Current schema version.
///
/// Increment when the layout of anything stored through this module changes
/// (including the file backend's record).
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope wrapped around every encoded value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    /// Must be `CACHE_MAGIC`
    pub magic: [u8; 4],
    /// Must be `CURRENT_SCHEMA_VERSION`
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Encode `value` inside an envelope.
///
/// # Errors
///
/// Returns `Error::SerializationError` if Postcard serialization fails.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        log::error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode bytes produced by [`serialize_for_cache`].
///
/// # Errors
///
/// - `Error::DeserializationError`: truncated or malformed bytes
/// - `Error::InvalidCacheEntry`: magic header is not ours
/// - `Error::VersionMismatch`: written by another schema version
pub fn deserialize_from_cache<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes).map_err(|e| {
        log::debug!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })?;

    if envelope.magic != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry(format!(
            "Invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        log::warn!(
            "Cache version mismatch: expected {}, got {}",
            CURRENT_SCHEMA_VERSION,
            envelope.version
        );
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found: envelope.version,
        });
    }

    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct VerificationCode {
        email: String,
        code: u32,
        attempts: u8,
    }

    fn sample() -> VerificationCode {
        VerificationCode {
            email: "alice@example.com".to_string(),
            code: 482913,
            attempts: 0,
        }
    }

    #[test]
    fn test_roundtrip() {
        let bytes = serialize_for_cache(&sample()).unwrap();
        let decoded: VerificationCode = deserialize_from_cache(&bytes).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_envelope_carries_magic_and_version() {
        let bytes = serialize_for_cache(&sample()).unwrap();

        // postcard uses varints, so inspect the decoded envelope instead of offsets
        let envelope: CacheEnvelope<VerificationCode> = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(envelope.magic, CACHE_MAGIC);
        assert_eq!(envelope.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(envelope.payload, sample());
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let mut envelope = CacheEnvelope::new(sample());
        envelope.magic = *b"CKIT";
        let bytes = postcard::to_allocvec(&envelope).unwrap();

        let result: Result<VerificationCode> = deserialize_from_cache(&bytes);
        match result.unwrap_err() {
            Error::InvalidCacheEntry(_) => {}
            e => panic!("Expected InvalidCacheEntry, got {:?}", e),
        }
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut envelope = CacheEnvelope::new(sample());
        envelope.version = 999;
        let bytes = postcard::to_allocvec(&envelope).unwrap();

        let result: Result<VerificationCode> = deserialize_from_cache(&bytes);
        match result.unwrap_err() {
            Error::VersionMismatch { expected, found } => {
                assert_eq!(expected, CURRENT_SCHEMA_VERSION);
                assert_eq!(found, 999);
            }
            e => panic!("Expected VersionMismatch, got {:?}", e),
        }
    }

    #[test]
    fn test_truncated_payload_rejected() {
        let mut bytes = serialize_for_cache(&sample()).unwrap();
        bytes.truncate(bytes.len() / 2);

        let result: Result<VerificationCode> = deserialize_from_cache(&bytes);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_empty_input_rejected() {
        let result: Result<VerificationCode> = deserialize_from_cache(&[]);
        assert!(matches!(result, Err(Error::DeserializationError(_))));
    }
}
