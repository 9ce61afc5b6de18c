//! Remote key-value store access
//!
//! The store contract is deliberately small: get/set/delete/exists with a
//! per-call TTL. There is no compare-and-swap, no multi-key transaction and
//! no pattern scan; bulk invalidation therefore iterates a hand-maintained
//! list of known keys (see `invalidate`).
//!
//! [`CacheStore`] is the adapter the rest of the crate talks to. It is
//! fail-soft: any transport or decode failure becomes a logged warning plus a
//! miss, so cache unavailability can never fail a request path, only force a
//! fallback to the upstream fetch.

mod memory;
mod rest;

pub use memory::MemoryKvStore;
pub use rest::RestKvStore;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{trace, warn};

use crate::stats::CacheStats;

/// Error types for raw KV store operations
#[derive(Debug, Error)]
pub enum KvError {
    /// HTTP request failed
    #[error("KV transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store returned an unexpected status
    #[error("KV store returned {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Access token missing or empty at construction time
    #[error("KV store access token is missing")]
    MissingCredentials,
}

/// Result type for raw KV store operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Remote key-value store with per-call TTL
///
/// No CAS, no transactions, no pattern scan.
#[async_trait]
pub trait KvStore: Send + Sync + std::fmt::Debug {
    /// Read a value; `None` when the key is absent or expired
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Write a value with a time-to-live
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()>;

    /// Delete a key; `true` when a value was removed
    async fn delete(&self, key: &str) -> KvResult<bool>;

    /// Check whether a key currently holds an unexpired value
    async fn exists(&self, key: &str) -> KvResult<bool>;
}

/// Fail-soft typed adapter over a [`KvStore`]
///
/// Constructed explicitly and passed down through application state; there is
/// no ambient global cache handle.
#[derive(Debug, Clone)]
pub struct CacheStore {
    store: Arc<dyn KvStore>,
    stats: CacheStats,
}

impl CacheStore {
    /// Create an adapter with fresh statistics
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            stats: CacheStats::new(),
        }
    }

    /// Create an adapter sharing an existing statistics tracker
    pub fn with_stats(store: Arc<dyn KvStore>, stats: CacheStats) -> Self {
        Self { store, stats }
    }

    /// Read and decode a cached value; any failure is a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    trace!("cache hit: {key}");
                    self.stats.record_hit();
                    Some(value)
                }
                Err(e) => {
                    warn!("cache entry for {key} undecodable, treating as miss: {e}");
                    self.stats.record_miss();
                    None
                }
            },
            Ok(None) => {
                trace!("cache miss: {key}");
                self.stats.record_miss();
                None
            }
            Err(e) => {
                warn!("cache read for {key} failed, treating as miss: {e}");
                self.stats.record_miss();
                None
            }
        }
    }

    /// Encode and write a value; `false` on any failure
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("cache value for {key} unserializable, skipping write: {e}");
                return false;
            }
        };

        match self.store.set(key, &raw, ttl).await {
            Ok(()) => {
                trace!("cache write: {key} (ttl {}s)", ttl.as_secs());
                self.stats.record_write();
                true
            }
            Err(e) => {
                warn!("cache write for {key} failed: {e}");
                false
            }
        }
    }

    /// Delete a key; `false` when absent or on failure
    pub async fn delete(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(deleted) => {
                if deleted {
                    self.stats.record_delete();
                }
                deleted
            }
            Err(e) => {
                warn!("cache delete for {key} failed: {e}");
                false
            }
        }
    }

    /// Check key presence; `false` on failure
    pub async fn exists(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!("cache exists check for {key} failed: {e}");
                false
            }
        }
    }

    /// Probe store connectivity, for the health endpoint
    pub async fn ping(&self) -> bool {
        self.store.exists("__ping__").await.is_ok()
    }

    /// Statistics tracker shared by this adapter
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
