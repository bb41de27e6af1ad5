//! In-Memory Backend Module
//!
//! HashMap storage with per-entry TTL and LRU eviction at a fixed capacity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{KeyValueBackend, LruIndex, StoredEntry};
use crate::cache::GlobPattern;
use crate::error::{BackendError, BackendResult};

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, StoredEntry>,
    lru: LruIndex,
}

impl Entries {
    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.map.remove(key).is_some()
    }
}

// == Memory Backend ==
/// Process-local key-value backend.
///
/// Expired entries are invisible to reads and are purged lazily on access or
/// by [`MemoryBackend::cleanup_expired`]. The availability switch lets callers
/// model an outage: while off, every operation fails with
/// [`BackendError::Unavailable`].
#[derive(Debug)]
pub struct MemoryBackend {
    entries: RwLock<Entries>,
    max_entries: usize,
    available: AtomicBool,
    evictions: AtomicU64,
}

impl MemoryBackend {
    // == Constructor ==
    /// Creates an empty backend holding at most `max_entries` keys.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            max_entries,
            available: AtomicBool::new(true),
            evictions: AtomicU64::new(0),
        }
    }

    /// Switches the backend on or off.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored entries, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of entries evicted for capacity since creation.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Remaining TTL of a live key, in seconds.
    pub async fn ttl(&self, key: &str) -> Option<u64> {
        let entries = self.entries.read().await;
        entries
            .map
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(StoredEntry::ttl_remaining)
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .map
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.remove(key);
        }
        expired.len()
    }

    fn ensure_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn get(&self, key: &str) -> BackendResult<Option<String>> {
        self.ensure_available()?;

        // Write lock: reads refresh LRU order and purge expired entries
        let mut entries = self.entries.write().await;
        let value = match entries.map.get(key) {
            None => return Ok(None),
            Some(entry) if entry.is_expired() => None,
            Some(entry) => Some(entry.value.clone()),
        };

        match value {
            Some(value) => {
                entries.lru.touch(key);
                Ok(Some(value))
            }
            None => {
                entries.remove(key);
                Ok(None)
            }
        }
    }

    async fn set_with_ttl(&self, key: &str, value: String, ttl_secs: u64) -> BackendResult<()> {
        self.ensure_available()?;

        let mut entries = self.entries.write().await;
        let is_overwrite = entries.map.contains_key(key);

        if !is_overwrite && entries.map.len() >= self.max_entries {
            match entries.lru.evict_oldest() {
                Some(evicted) => {
                    entries.map.remove(&evicted);
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %evicted, "Evicted least recently used entry");
                }
                None => {
                    return Err(BackendError::Operation(
                        "backend has no capacity".to_string(),
                    ))
                }
            }
        }

        entries
            .map
            .insert(key.to_string(), StoredEntry::new(value, ttl_secs));
        entries.lru.touch(key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        self.ensure_available()?;
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys_matching(&self, pattern: &str) -> BackendResult<Vec<String>> {
        self.ensure_available()?;

        let pattern = GlobPattern::new(pattern);
        let entries = self.entries.read().await;
        Ok(entries
            .map
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete_many(&self, keys: &[String]) -> BackendResult<()> {
        self.ensure_available()?;

        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn flush_all(&self) -> BackendResult<()> {
        self.ensure_available()?;

        let mut entries = self.entries.write().await;
        entries.map.clear();
        entries.lru.clear();
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn value(v: &str) -> String {
        v.to_string()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("key1", value("value1"), 60).await.unwrap();

        assert_eq!(backend.get("key1").await.unwrap(), Some(value("value1")));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let backend = MemoryBackend::new(100);
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("key1", value("value1"), 60).await.unwrap();
        backend.set_with_ttl("key1", value("value2"), 60).await.unwrap();

        assert_eq!(backend.get("key1").await.unwrap(), Some(value("value2")));
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("key1", value("value1"), 60).await.unwrap();
        backend.delete("key1").await.unwrap();
        backend.delete("key1").await.unwrap();

        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("key1", value("value1"), 1).await.unwrap();
        assert!(backend.get("key1").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(backend.get("key1").await.unwrap(), None);
        // Expired entry was purged on read
        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_ttl_reported() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("key1", value("v"), 1800).await.unwrap();

        let ttl = backend.ttl("key1").await.unwrap();
        assert!((1799..=1800).contains(&ttl));
        assert_eq!(backend.ttl("missing").await, None);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let backend = MemoryBackend::new(3);

        backend.set_with_ttl("key1", value("1"), 60).await.unwrap();
        backend.set_with_ttl("key2", value("2"), 60).await.unwrap();
        backend.set_with_ttl("key3", value("3"), 60).await.unwrap();

        // Reading key1 makes key2 the oldest
        backend.get("key1").await.unwrap();
        backend.set_with_ttl("key4", value("4"), 60).await.unwrap();

        assert_eq!(backend.len().await, 3);
        assert_eq!(backend.evictions(), 1);
        assert!(backend.get("key1").await.unwrap().is_some());
        assert_eq!(backend.get("key2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zero_capacity_rejects_writes() {
        let backend = MemoryBackend::new(0);

        let result = backend.set_with_ttl("key1", value("1"), 60).await;
        assert!(matches!(result, Err(BackendError::Operation(_))));
    }

    #[tokio::test]
    async fn test_keys_matching_and_delete_many() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("a:1", value("1"), 60).await.unwrap();
        backend.set_with_ttl("a:2", value("2"), 60).await.unwrap();
        backend.set_with_ttl("b:1", value("3"), 60).await.unwrap();

        let mut keys = backend.keys_matching("a:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec![value("a:1"), value("a:2")]);

        backend.delete_many(&keys).await.unwrap();
        assert_eq!(backend.len().await, 1);
        assert!(backend.get("b:1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_keys_matching_skips_expired() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("a:1", value("1"), 0).await.unwrap();
        assert!(backend.keys_matching("a:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_all() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("a:1", value("1"), 60).await.unwrap();
        backend.set_with_ttl("b:1", value("2"), 60).await.unwrap();
        backend.flush_all().await.unwrap();

        assert!(backend.is_empty().await);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let backend = MemoryBackend::new(100);

        backend.set_with_ttl("short", value("1"), 0).await.unwrap();
        backend.set_with_ttl("long", value("2"), 60).await.unwrap();

        assert_eq!(backend.cleanup_expired().await, 1);
        assert_eq!(backend.len().await, 1);
    }

    #[tokio::test]
    async fn test_unavailable_rejects_everything() {
        let backend = MemoryBackend::new(100);
        backend.set_with_ttl("key1", value("1"), 60).await.unwrap();

        backend.set_available(false);

        assert!(!backend.is_available().await);
        assert_eq!(backend.get("key1").await, Err(BackendError::Unavailable));
        assert_eq!(
            backend.set_with_ttl("key2", value("2"), 60).await,
            Err(BackendError::Unavailable)
        );
        assert_eq!(backend.flush_all().await, Err(BackendError::Unavailable));

        backend.set_available(true);
        assert_eq!(backend.get("key1").await.unwrap(), Some(value("1")));
    }
}
