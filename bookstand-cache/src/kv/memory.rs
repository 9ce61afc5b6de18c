//! In-memory KV store for tests and local development

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{KvResult, KvStore};

/// In-process store honoring per-entry TTLs
///
/// Expiry is checked on access; expired entries are removed lazily. Behavior
/// matches the remote store contract closely enough for the cache layer not
/// to notice the difference.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, (String, Instant)>,
}

impl MemoryKvStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| entry.value().1 > now)
            .count()
    }

    /// Whether the store holds no live entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if *expires_at > Instant::now() {
                return Ok(Some(value.clone()));
            }
        }
        // Expired or absent; drop any stale entry
        self.entries
            .remove_if(key, |_, (_, expires_at)| *expires_at <= Instant::now());
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        self.entries
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
