//! Backend Module
//!
//! The key-value store the coordinator caches into, and an in-process
//! implementation of it.

mod entry;
mod lru;
mod memory;

use async_trait::async_trait;

use crate::error::BackendResult;

pub use entry::StoredEntry;
pub use lru::LruIndex;
pub use memory::MemoryBackend;

// == Key-Value Backend ==
/// Storage the coordinator reads from and writes to.
///
/// Every operation may fail; the coordinator treats any error as "cache
/// unavailable" for that single call. Expiry is the backend's job.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Liveness check, consulted before every read-through lookup.
    async fn is_available(&self) -> bool;

    /// Returns the stored value, or None if absent or expired.
    async fn get(&self, key: &str) -> BackendResult<Option<String>>;

    /// Stores a value that expires after `ttl_secs` seconds.
    async fn set_with_ttl(&self, key: &str, value: String, ttl_secs: u64) -> BackendResult<()>;

    /// Removes a key. Absent keys are not an error.
    async fn delete(&self, key: &str) -> BackendResult<()>;

    /// Lists every live key matching a glob pattern.
    async fn keys_matching(&self, pattern: &str) -> BackendResult<Vec<String>>;

    /// Removes a batch of keys.
    async fn delete_many(&self, keys: &[String]) -> BackendResult<()>;

    /// Removes every key.
    async fn flush_all(&self) -> BackendResult<()>;
}
