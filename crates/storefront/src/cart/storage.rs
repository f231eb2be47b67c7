//! Key/value string storage for the persisted cart.
//!
//! The cart only needs "read a string by key" and "overwrite a string by
//! key". [`FileStorage`] keeps one file per key on disk, the server-side
//! stand-in for browser local storage. [`MemoryStorage`] keeps everything in
//! process.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Errors reading or writing persisted values.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opaque string key/value store.
pub trait CartStorage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Overwrite the value stored under `key`.
    fn save(&self, key: &str, value: &str)
    -> impl Future<Output = Result<(), StorageError>> + Send;
}

// =============================================================================
// MemoryStorage
// =============================================================================

/// In-process storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding one value.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage.lock().insert(key.to_string(), value.to_string());
        storage
    }

    /// Current value under `key`, without counting as a read.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Number of `save` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CartStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// FileStorage
// =============================================================================

/// One file per key under a directory.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// crash mid-write leaves the previous value intact. Temporary names are
/// unique per process and per write, so the server and CLI can share a
/// directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Store files under `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

impl CartStorage for FileStorage {
    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.path_for(key);
        let temp = temp_path(&target);
        tokio::fs::write(&temp, value).await?;
        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }
}

/// Temporary sibling of `target` that no other writer uses.
fn temp_path(target: &Path) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let seq = NEXT.fetch_add(1, Ordering::Relaxed);
    target.with_extension(format!("json.{}.{seq}.tmp", std::process::id()))
}

/// Map a storage key onto a portable file name.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem_sanitizes_key() {
        assert_eq!(file_stem("@RocketShoes:cart"), "_RocketShoes_cart");
        assert_eq!(file_stem("../../etc/passwd"), "______etc_passwd");
    }

    #[tokio::test]
    async fn test_memory_storage_counts_writes() {
        let storage = MemoryStorage::new();
        assert!(storage.load("k").await.unwrap().is_none());

        storage.save("k", "v1").await.unwrap();
        storage.save("k", "v2").await.unwrap();

        assert_eq!(storage.load("k").await.unwrap().as_deref(), Some("v2"));
        assert_eq!(storage.writes(), 2);
    }

    #[tokio::test]
    async fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.load("@RocketShoes:cart").await.unwrap().is_none());

        storage.save("@RocketShoes:cart", "[]").await.unwrap();
        storage.save("@RocketShoes:cart", "[1]").await.unwrap();

        assert_eq!(
            storage.load("@RocketShoes:cart").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert_eq!(files_in(&dir.path().join("nested")), vec!["_RocketShoes_cart.json"]);
    }

    #[test]
    fn test_temp_paths_are_unique_per_write() {
        let target = PathBuf::from("/carts/_RocketShoes_cart.json");

        let first = temp_path(&target);
        let second = temp_path(&target);

        assert_ne!(first, second);
        assert_eq!(first.parent(), target.parent());
        assert!(
            first
                .to_string_lossy()
                .contains(&format!(".json.{}.", std::process::id()))
        );
    }

    #[tokio::test]
    async fn test_concurrent_writers_share_directory() {
        let dir = tempfile::tempdir().unwrap();
        let server = FileStorage::new(dir.path());
        let cli = FileStorage::new(dir.path());

        let writes = (0..10).map(|i| {
            let storage = if i % 2 == 0 { server.clone() } else { cli.clone() };
            tokio::spawn(async move { storage.save("@RocketShoes:cart", &format!("[{i}]")).await })
        });
        for handle in writes.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }

        let saved = server.load("@RocketShoes:cart").await.unwrap().unwrap();
        assert!((0..10).any(|i| saved == format!("[{i}]")));
        assert_eq!(files_in(dir.path()), vec!["_RocketShoes_cart.json"]);
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
