//! Cache key and TTL validation.

use crate::error::{Error, Result};
use std::time::Duration;

/// TTL used by callers that have no better idea (five minutes).
pub const DEFAULT_TTL_SECS: i64 = 300;

/// Longest lifetime a backend is asked to keep an entry (100 years).
///
/// Larger TTLs are accepted and clamped to this, so deadline arithmetic
/// cannot overflow and every backend agrees on the effective lifetime.
pub const MAX_TTL_SECS: i64 = 100 * 365 * 24 * 60 * 60;

/// `ttl` result for a key that does not exist.
pub const TTL_MISSING: i64 = -2;

/// `ttl` result for a key that exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Whether `key` is usable as a cache key.
///
/// Read paths use this to short-circuit to "absent" instead of failing.
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Reject empty and whitespace-only keys.
///
/// # Errors
/// Returns `Error::InvalidArgument` for an unusable key.
pub fn validate_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(
            "key must be a non-empty string (not blank or whitespace only)".to_string(),
        ))
    }
}

/// Check a TTL in seconds and convert it to a `Duration`.
///
/// Values above [`MAX_TTL_SECS`] are clamped to it.
///
/// # Errors
/// Returns `Error::InvalidArgument` when `ttl_seconds <= 0`.
pub fn validate_ttl(ttl_seconds: i64) -> Result<Duration> {
    if ttl_seconds <= 0 {
        return Err(Error::InvalidArgument(format!(
            "ttl must be a positive number of seconds, got {}",
            ttl_seconds
        )));
    }
    Ok(Duration::from_secs(ttl_seconds.min(MAX_TTL_SECS) as u64))
}

/// Whole seconds left in `remaining`, rounded up so a live entry never
/// reports zero.
pub(crate) fn remaining_secs(remaining: Duration) -> i64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    i64::try_from(secs).unwrap_or(MAX_TTL_SECS).max(1)
}

/// Validate both arguments of a `set` call.
pub(crate) fn validate_set(key: &str, ttl_seconds: i64) -> Result<Duration> {
    validate_key(key)?;
    validate_ttl(ttl_seconds)
}
