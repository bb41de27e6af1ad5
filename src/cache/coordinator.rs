//! Cache Coordinator Module
//!
//! Read-through front-end over a [`KeyValueBackend`]: coalesces concurrent
//! misses, enforces the value size limit, and fails open whenever the backend
//! is down.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::backend::KeyValueBackend;
use crate::cache::inflight::{Claim, FetchOutcome, FetchedValue, InFlightRegistry};
use crate::cache::{
    CacheStats, Codec, GlobPattern, JsonCodec, StatsSnapshot, DEFAULT_MAX_VALUE_SIZE,
};
use crate::error::{CacheError, FetchError, Result};

// == Coordinator Config ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Encoded values larger than this are never written to the backend
    pub max_value_size: usize,
    /// Upper bound on one origin fetch; None waits indefinitely
    pub fetch_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
            fetch_timeout: None,
        }
    }
}

struct Inner<C> {
    backend: Option<Arc<dyn KeyValueBackend>>,
    codec: C,
    config: CoordinatorConfig,
    stats: CacheStats,
    in_flight: Arc<InFlightRegistry>,
}

// == Cache Coordinator ==
/// Cheaply clonable handle; clones share backend, statistics and the
/// in-flight registry.
pub struct CacheCoordinator<C: Codec = JsonCodec> {
    inner: Arc<Inner<C>>,
}

impl<C: Codec> Clone for CacheCoordinator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl CacheCoordinator<JsonCodec> {
    // == Constructors ==
    /// Creates a JSON coordinator over `backend` with default limits.
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self::with_config(backend, CoordinatorConfig::default())
    }

    pub fn with_config(backend: Arc<dyn KeyValueBackend>, config: CoordinatorConfig) -> Self {
        Self::with_codec(Some(backend), JsonCodec, config)
    }

    /// Creates a coordinator with no backend: every `get` goes to the origin.
    pub fn without_backend() -> Self {
        Self::with_codec(None, JsonCodec, CoordinatorConfig::default())
    }
}

impl<C: Codec> CacheCoordinator<C> {
    pub fn with_codec(
        backend: Option<Arc<dyn KeyValueBackend>>,
        codec: C,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                codec,
                config,
                stats: CacheStats::new(),
                in_flight: Arc::new(InFlightRegistry::new()),
            }),
        }
    }

    // == Get ==
    /// Returns the cached value for `key`, or fetches, caches and returns it.
    ///
    /// Concurrent misses on the same key share one call to `fetch`; every
    /// caller sees its value or its error. Waiters of the same type get a
    /// clone of the fetched value itself, never an encode/decode copy.
    /// `fetch` runs on its own task and completes even if all callers stop
    /// waiting. When the backend is unavailable `fetch` is awaited directly
    /// and nothing is cached.
    pub async fn get<T, F, Fut, E>(&self, key: &str, fetch: F, ttl_secs: u64) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        E: Into<anyhow::Error> + Send + 'static,
    {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("key must not be empty".to_string()));
        }

        let Some(backend) = self.inner.live_backend().await else {
            debug!("Cache unavailable, fetching '{}' from origin", key);
            return Ok(self.inner.call_origin(fetch).await?);
        };

        match backend.get(key).await {
            Ok(Some(raw)) => match self.inner.codec.decode::<T>(&raw) {
                Ok(value) => {
                    self.inner.stats.record_hit();
                    debug!("Cache hit for '{}'", key);
                    return Ok(value);
                }
                Err(err) => warn!("Ignoring undecodable cache entry '{}': {}", key, err),
            },
            Ok(None) => {}
            Err(err) => {
                warn!("Cache read for '{}' failed, bypassing cache: {}", key, err);
                return Ok(self.inner.call_origin(fetch).await?);
            }
        }

        self.inner.stats.record_miss();

        let shared = match self.inner.in_flight.join_or_register(key) {
            Claim::Joined(shared) => {
                debug!("Cache miss for '{}', joining in-flight fetch", key);
                shared
            }
            Claim::Leader { fetch: shared, completion } => {
                debug!("Cache miss for '{}', fetching from origin", key);
                let inner = Arc::clone(&self.inner);
                let key = key.to_string();
                tokio::spawn(async move {
                    let outcome = inner.populate(&key, fetch, ttl_secs).await;
                    completion.complete(outcome);
                });
                shared
            }
        };

        let fetched = shared.await?;
        if let Some(value) = fetched.downcast::<T>() {
            return Ok(value);
        }
        // Joined a fetch started for another type
        match fetched.payload() {
            Some(payload) => self.inner.codec.decode(payload).map_err(CacheError::Decode),
            None => Err(CacheError::Decode(format!(
                "in-flight value for '{}' has a different type",
                key
            ))),
        }
    }

    // == Set ==
    /// Writes a value. Oversized values, encoding failures and backend
    /// failures are logged and skipped.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        match self.inner.codec.encode(value) {
            Ok(payload) => {
                self.inner.store(key, payload, ttl_secs).await;
            }
            Err(err) => warn!("Not caching '{}', encoding failed: {}", key, err),
        }
    }

    // == Delete ==
    /// Removes one key. No-op if absent or if the backend is unavailable.
    pub async fn delete(&self, key: &str) {
        let Some(backend) = self.inner.live_backend().await else {
            return;
        };
        match backend.delete(key).await {
            Ok(()) => debug!("Invalidated '{}'", key),
            Err(err) => warn!("Failed to delete '{}': {}", key, err),
        }
    }

    /// Alias of [`CacheCoordinator::delete`].
    pub async fn invalidate(&self, key: &str) {
        self.delete(key).await;
    }

    // == Delete Pattern ==
    /// Removes every key matching a glob pattern in one batch.
    ///
    /// Cost grows with the backend's total key count. Returns the number of
    /// keys removed, 0 if the backend is unavailable or failed.
    pub async fn delete_pattern(&self, pattern: &str) -> usize {
        let Some(backend) = self.inner.live_backend().await else {
            return 0;
        };

        let pattern = GlobPattern::new(pattern);
        let keys = match backend.keys_matching(pattern.as_str()).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("Failed to list keys for pattern '{}': {}", pattern, err);
                return 0;
            }
        };
        if keys.is_empty() {
            return 0;
        }

        match backend.delete_many(&keys).await {
            Ok(()) => {
                info!("Invalidated {} keys matching '{}'", keys.len(), pattern);
                keys.len()
            }
            Err(err) => {
                warn!("Failed to delete keys matching '{}': {}", pattern, err);
                0
            }
        }
    }

    // == Flush All ==
    /// Empties the whole cache. Callers must restrict this to administrators.
    pub async fn flush_all(&self) {
        let Some(backend) = self.inner.live_backend().await else {
            return;
        };
        match backend.flush_all().await {
            Ok(()) => info!("Cache flushed"),
            Err(err) => warn!("Failed to flush cache: {}", err),
        }
    }

    // == Stats ==
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot(self.inner.in_flight.len())
    }

    /// Whether a backend is configured and currently reports itself live.
    pub async fn is_available(&self) -> bool {
        self.inner.live_backend().await.is_some()
    }
}

impl<C: Codec> Inner<C> {
    async fn live_backend(&self) -> Option<&Arc<dyn KeyValueBackend>> {
        let backend = self.backend.as_ref()?;
        if backend.is_available().await {
            Some(backend)
        } else {
            None
        }
    }

    async fn call_origin<T, F, Fut, E>(&self, fetch: F) -> std::result::Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<anyhow::Error>,
    {
        match self.config.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch()).await {
                Ok(result) => result.map_err(FetchError::origin),
                Err(_) => Err(FetchError::TimedOut(limit)),
            },
            None => fetch().await.map_err(FetchError::origin),
        }
    }

    /// Runs the origin fetch for a registered miss and caches its value.
    ///
    /// A value that cannot be encoded is still returned, just not cached.
    async fn populate<T, F, Fut, E>(&self, key: &str, fetch: F, ttl_secs: u64) -> FetchOutcome
    where
        T: Serialize + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<anyhow::Error>,
    {
        let value = self.call_origin(fetch).await.inspect_err(|err| {
            warn!("Origin fetch for '{}' failed: {}", key, err);
        })?;
        let payload = match self.codec.encode(&value) {
            Ok(payload) => {
                self.store(key, payload.clone(), ttl_secs).await;
                Some(payload)
            }
            Err(err) => {
                warn!("Not caching '{}', encoding failed: {}", key, err);
                None
            }
        };
        Ok(FetchedValue::new(value, payload))
    }

    async fn store(&self, key: &str, payload: String, ttl_secs: u64) {
        if payload.len() > self.config.max_value_size {
            warn!(
                "Not caching '{}': {} bytes exceeds limit of {} bytes",
                key,
                payload.len(),
                self.config.max_value_size
            );
            return;
        }

        let Some(backend) = self.live_backend().await else {
            return;
        };
        if let Err(err) = backend.set_with_ttl(key, payload, ttl_secs).await {
            warn!("Failed to cache '{}': {}", key, err);
        }
    }
}
