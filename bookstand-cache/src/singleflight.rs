//! Per-key coalescing of in-flight upstream fetches
//!
//! Concurrent cache misses for the same key must trigger one upstream call,
//! not N. The first miss becomes the leader and performs the fetch; every
//! concurrent miss for that key subscribes to the leader's result instead of
//! fetching again. The registry entry lives exactly as long as the leader's
//! fetch, including early drops of the leader task.

use std::future::Future;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::{Error, Result};

/// Leader outcome shared with followers; errors travel rendered, the full
/// error stays with the leader
type Outcome<T> = std::result::Result<T, String>;

enum Role<T: Clone> {
    Leader,
    Follower(broadcast::Receiver<Outcome<T>>),
}

/// In-flight fetch registry for one value type
///
/// Keys are cache keys, already tier-prefixed, so one registry per value
/// type is enough even when tiers share it.
#[derive(Debug)]
pub struct Flights<T: Clone + Send> {
    inflight: DashMap<String, broadcast::Sender<Outcome<T>>>,
}

impl<T: Clone + Send> Default for Flights<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Flights<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Number of fetches currently in flight
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Run `fetch` for `key`, coalescing with any concurrent caller
    ///
    /// The leader runs `fetch` inline and broadcasts the outcome; followers
    /// await it. A leader that is dropped mid-fetch releases the key, and its
    /// followers see a coalesced error rather than hanging.
    pub async fn coalesce<F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let role = match self.inflight.entry(key.to_string()) {
            Entry::Occupied(entry) => Role::Follower(entry.get().subscribe()),
            Entry::Vacant(slot) => {
                let (tx, _rx) = broadcast::channel(1);
                slot.insert(tx);
                Role::Leader
            }
        };

        match role {
            Role::Follower(mut rx) => {
                debug!("coalescing onto in-flight fetch for {key}");
                match rx.recv().await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(message)) => Err(Error::coalesced(message)),
                    Err(_) => Err(Error::coalesced("in-flight fetch was abandoned")),
                }
            }
            Role::Leader => {
                trace!("leading upstream fetch for {key}");
                let mut guard = CleanupGuard {
                    inflight: &self.inflight,
                    key,
                    armed: true,
                };

                let result = fetch().await;

                guard.armed = false;
                if let Some((_, tx)) = self.inflight.remove(key) {
                    let outcome = match &result {
                        Ok(value) => Ok(value.clone()),
                        Err(e) => Err(e.to_string()),
                    };
                    // No receivers is fine, nobody coalesced with us
                    let _ = tx.send(outcome);
                }
                result
            }
        }
    }
}

/// Removes the registry entry when a leader is dropped before completing
struct CleanupGuard<'a, T: Clone + Send> {
    inflight: &'a DashMap<String, broadcast::Sender<Outcome<T>>>,
    key: &'a str,
    armed: bool,
}

impl<T: Clone + Send> Drop for CleanupGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.inflight.remove(self.key);
        }
    }
}
