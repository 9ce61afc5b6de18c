//! Error types for the bookstand-cache crate
//!
//! Cache transport failures never appear here: the fail-soft store adapter
//! converts them to misses. Only upstream failures (after retries) and
//! configuration problems reach callers, and an empty result is always `Ok`.

use thiserror::Error;

/// Result type for cache-layer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache-layer operations
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream catalog call failed after retries
    #[error("catalog error: {0}")]
    Catalog(#[from] catalog_client::Error),

    /// Vector search provider call failed
    #[error("search provider error: {0}")]
    Search(#[from] vector_client::Error),

    /// A coalesced in-flight fetch failed in the leader request
    #[error("coalesced upstream fetch failed: {message}")]
    Coalesced {
        /// Rendered leader error
        message: String,
    },

    /// Search requested but no search provider is configured
    #[error("search is not configured for this deployment")]
    SearchUnavailable,
}

impl Error {
    /// Create a coalesced-fetch error from the leader's failure
    pub fn coalesced(message: impl Into<String>) -> Self {
        Self::Coalesced {
            message: message.into(),
        }
    }
}
