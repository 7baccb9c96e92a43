//! Cache-or-fetch engine over a pluggable key/value store.
//!
//! Each stored value is a JSON envelope carrying the payload together with
//! the time it was stored and its TTL, so expiry is evaluated here at read
//! time regardless of what the backing store does with its own eviction.
//!
//! ## Cache Key Strategy
//!
//! Keys are `"{namespace}:{key}"` (or just `key` without a namespace). Keys
//! must never contain raw credentials; see [`crate::gallery::image_cache_key`].
//!
//! ## Failure policy
//!
//! Store and decode errors are logged and treated as misses. A failing
//! factory falls back to the last stored value even if it has expired, and
//! to `T::default()` when there is none. Nothing here returns an error to the
//! caller.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use candor_core::metrics::{self as m, CACHE_HITS, CACHE_MISSES, CACHE_STALE_SERVED};
use moka::future::Cache;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Default capacity of the in-memory store (number of entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Error reported by a backing store.
#[derive(Debug, thiserror::Error)]
#[error("cache store error: {0}")]
pub struct StoreError(pub String);

/// One-entry-per-key store: put, match, delete. Each call is atomic per key.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// The platform's "match": the stored value, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store backed by moka.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Cache<String, String>,
}

impl MemoryStore {
    pub fn new(capacity: u64) -> Self {
        Self {
            inner: Cache::builder().max_capacity(capacity).build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.insert(key.to_string(), value).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.get(key).await)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

/// Stored envelope. Valid iff `now - timestamp <= ttl`.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    /// Unix milliseconds at store time.
    timestamp: i64,
    /// Milliseconds.
    ttl: i64,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, now: i64) -> bool {
        now.saturating_sub(self.timestamp) <= self.ttl
    }
}

enum Lookup<T> {
    Fresh(T),
    Expired(T),
    Missing,
}

/// Source of "now" in Unix milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Get-or-compute cache with TTL expiry and stale-on-error fallback.
#[derive(Clone)]
pub struct CacheEngine {
    store: Arc<dyn CacheStore>,
    clock: Clock,
}

impl CacheEngine {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_clock(store, Arc::new(candor_core::now_millis))
    }

    pub fn with_clock(store: Arc<dyn CacheStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// A fresh cached value. Expired entries are deleted and reported absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, namespace: Option<&str>) -> Option<T> {
        let full_key = cache_key(namespace, key);
        match self.lookup(&full_key).await {
            Lookup::Fresh(value) => {
                tracing::debug!(key = %full_key, "cache hit");
                Some(value)
            }
            Lookup::Expired(_) => {
                tracing::debug!(key = %full_key, "cache expired");
                self.delete(key, namespace).await;
                None
            }
            Lookup::Missing => None,
        }
    }

    /// Store a value. Failures are logged.
    pub async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        namespace: Option<&str>,
    ) {
        let full_key = cache_key(namespace, key);
        let entry = CacheEntry {
            data: value,
            timestamp: (self.clock)(),
            ttl: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "failed to serialize for cache");
                return;
            }
        };

        match self.store.put(&full_key, json).await {
            Ok(()) => tracing::debug!(key = %full_key, ttl_ms = entry.ttl, "cache stored"),
            Err(e) => tracing::warn!(key = %full_key, error = %e, "failed to store cache entry"),
        }
    }

    /// Remove a value. Deleting an absent key is a no-op.
    pub async fn delete(&self, key: &str, namespace: Option<&str>) {
        let full_key = cache_key(namespace, key);
        if let Err(e) = self.store.delete(&full_key).await {
            tracing::warn!(key = %full_key, error = %e, "failed to delete cache entry");
        }
    }

    /// Whether a fresh entry exists.
    pub async fn has(&self, key: &str, namespace: Option<&str>) -> bool {
        self.get::<serde_json::Value>(key, namespace).await.is_some()
    }

    /// Return the cached value, or compute, store and return it.
    ///
    /// An expired entry is left in place until the factory succeeds and
    /// overwrites it, so that a failing factory can still be answered from
    /// it. Failed computations are never stored.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl: Duration,
        namespace: Option<&str>,
    ) -> T
    where
        T: Serialize + DeserializeOwned + Default,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let full_key = cache_key(namespace, key);

        let stale = match self.lookup(&full_key).await {
            Lookup::Fresh(value) => {
                tracing::debug!(key = %full_key, "cache hit");
                m::increment(CACHE_HITS);
                return value;
            }
            Lookup::Expired(value) => Some(value),
            Lookup::Missing => None,
        };

        tracing::debug!(key = %full_key, stale = stale.is_some(), "cache miss, computing");
        m::increment(CACHE_MISSES);

        match factory().await {
            Ok(value) => {
                self.set(key, &value, ttl, namespace).await;
                value
            }
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "cache factory failed");
                if let Some(value) = stale {
                    m::increment(CACHE_STALE_SERVED);
                    tracing::info!(key = %full_key, "serving stale cache entry");
                    return value;
                }
                match self.lookup(&full_key).await {
                    Lookup::Fresh(value) | Lookup::Expired(value) => {
                        m::increment(CACHE_STALE_SERVED);
                        value
                    }
                    Lookup::Missing => T::default(),
                }
            }
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, full_key: &str) -> Lookup<T> {
        let raw = match self.store.get(full_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Lookup::Missing,
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "cache read failed");
                return Lookup::Missing;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if entry.is_fresh((self.clock)()) => Lookup::Fresh(entry.data),
            Ok(entry) => Lookup::Expired(entry.data),
            Err(e) => {
                // Corrupted cache entry - log and treat as absent
                tracing::warn!(key = %full_key, error = %e, "failed to deserialize cached entry");
                Lookup::Missing
            }
        }
    }
}

/// `"{namespace}:{key}"`, or `key` alone.
pub fn cache_key(namespace: Option<&str>, key: &str) -> String {
    match namespace {
        Some(ns) => format!("{ns}:{key}"),
        None => key.to_string(),
    }
}
