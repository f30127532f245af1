//! File-backed cache backend.
//!
//! One file per key under a configured directory, named by the 128-bit
//! xxh3 hash of the key so any key maps to a short, path-safe name. Each
//! file holds an enveloped postcard record of the key, its absolute expiry
//! time (unix seconds) and the value, so entries survive a process restart.
//! A record whose stored key differs from the one asked for (a hash
//! collision) reads as absent.
//!
//! There is no bound on the number of files: growth is limited only by TTL
//! expiry (lazy, or through [`FileBackend::purge_expired`]) and by whatever
//! cleans the directory externally. No in-process lock is taken; each write
//! goes to its own temp file and lands through a rename, so concurrent
//! writers to one key are last writer wins.

use super::CacheBackend;
use crate::error::{Error, Result};
use crate::key::{
    is_valid_key, remaining_secs, validate_set, validate_ttl, MAX_TTL_SECS, TTL_MISSING,
};
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use xxhash_rust::xxh3::xxh3_128;

const CACHE_EXTENSION: &str = "cache";
const TEMP_EXTENSION: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// On-disk content of one cache file.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct FileRecord {
    key: String,
    /// Unix timestamp in seconds.
    expires_at: f64,
    value: Vec<u8>,
}

impl FileRecord {
    fn is_expired(&self, now: f64) -> bool {
        now > self.expires_at
    }
}

fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn key_hash(key: &str) -> String {
    format!("{:032x}", xxh3_128(key.as_bytes()))
}

/// File name holding `key`: `<32 hex digits>.cache`.
fn file_name_for(key: &str) -> String {
    format!("{}.{}", key_hash(key), CACHE_EXTENSION)
}

/// A temp file name no other write in this or another process is using.
fn temp_name_for(key: &str) -> String {
    format!(
        "{}.{}-{}.{}",
        key_hash(key),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        TEMP_EXTENSION
    )
}

/// File-backed cache backend.
///
/// # Example
///
/// ```no_run
/// use cache_switch::backend::{CacheBackend, FileBackend};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = FileBackend::new("storage/cache").await?;
///
///     backend.set("report:2024", b"...".to_vec(), 3600).await?;
///     assert!(backend.exists("report:2024").await);
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct FileBackend {
    dir: Arc<PathBuf>,
}

impl FileBackend {
    /// Open (creating if needed) the cache directory.
    ///
    /// # Errors
    /// Returns `Error::StorageFailure` if the directory cannot be created.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::StorageFailure(format!(
                "Failed to create cache directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        info!("✓ File backend initialized: {}", dir.display());
        Ok(FileBackend { dir: Arc::new(dir) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name_for(key))
    }

    /// Read and decode a record. Missing or unreadable files yield `None`.
    async fn read_record(path: &Path) -> Option<FileRecord> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("File cache read failed for {}: {}", path.display(), e);
                return None;
            }
        };

        match deserialize_from_cache::<FileRecord>(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Look up a live record, deleting it if it has expired.
    async fn live_record(&self, key: &str) -> Option<FileRecord> {
        if !is_valid_key(key) {
            return None;
        }

        let path = self.path_for(key);
        let record = Self::read_record(&path).await?;
        if record.key != key {
            debug!("File cache hash collision: {} holds {}", path.display(), record.key);
            return None;
        }
        if record.is_expired(unix_now()) {
            let _ = fs::remove_file(&path).await;
            return None;
        }
        Some(record)
    }

    /// Encode `record` and move it into place under its key's file name.
    async fn write_record(&self, record: &FileRecord) -> Result<()> {
        let bytes = serialize_for_cache(record)?;
        let path = self.path_for(&record.key);
        let temp_path = self.dir.join(temp_name_for(&record.key));

        self.write_atomic(&temp_path, &path, &bytes).await.map_err(|e| {
            error!("File SET failed for key {}: {}", record.key, e);
            Error::StorageFailure(format!(
                "Failed to write cache file {}: {}",
                path.display(),
                e
            ))
        })
    }

    async fn write_atomic(&self, temp_path: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let written = async {
            let mut file = fs::File::create(temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(temp_path, path).await
        }
        .await;

        if written.is_err() {
            let _ = fs::remove_file(temp_path).await;
        }
        written
    }

    /// Remove every expired or undecodable cache file in the directory.
    ///
    /// Returns the number of files removed.
    ///
    /// # Errors
    /// Returns `Error::StorageFailure` if the directory cannot be listed.
    pub async fn purge_expired(&self) -> Result<usize> {
        let now = unix_now();
        let mut removed = 0;
        let mut entries = fs::read_dir(self.dir.as_path()).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }

            let stale = match Self::read_record(&path).await {
                Some(record) => record.is_expired(now),
                None => true,
            };
            if stale && fs::remove_file(&path).await.is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!("✓ File PURGE removed {} stale entries", removed);
        }
        Ok(removed)
    }
}

impl CacheBackend for FileBackend {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.live_record(key).await {
            Some(record) => {
                debug!("✓ File GET {} -> HIT", key);
                Some(record.value)
            }
            None => {
                debug!("✓ File GET {} -> MISS", key);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_seconds: i64) -> Result<()> {
        let ttl = validate_set(key, ttl_seconds)?;

        let record = FileRecord {
            key: key.to_string(),
            expires_at: unix_now() + ttl.as_secs_f64(),
            value,
        };
        self.write_record(&record).await?;

        debug!("✓ File SET {} (TTL: {}s)", key, ttl_seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) {
        if !is_valid_key(key) {
            return;
        }
        let _ = fs::remove_file(self.path_for(key)).await;
        debug!("✓ File DELETE {}", key);
    }

    async fn exists(&self, key: &str) -> bool {
        self.live_record(key).await.is_some()
    }

    async fn expire(&self, key: &str, ttl_seconds: i64) -> bool {
        let ttl = match validate_ttl(ttl_seconds) {
            Ok(ttl) => ttl,
            Err(_) => return false,
        };
        let mut record = match self.live_record(key).await {
            Some(record) => record,
            None => return false,
        };

        record.expires_at = unix_now() + ttl.as_secs_f64();
        match self.write_record(&record).await {
            Ok(()) => {
                debug!("✓ File EXPIRE {} (TTL: {}s)", key, ttl_seconds);
                true
            }
            Err(e) => {
                warn!("File EXPIRE {} failed: {}", key, e);
                false
            }
        }
    }

    async fn ttl(&self, key: &str) -> i64 {
        match self.live_record(key).await {
            Some(record) => {
                let remaining = (record.expires_at - unix_now()).max(0.0);
                remaining_secs(
                    Duration::try_from_secs_f64(remaining)
                        .unwrap_or(Duration::from_secs(MAX_TTL_SECS as u64)),
                )
            }
            None => TTL_MISSING,
        }
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}
