//! Error types for catalog provider operations

use thiserror::Error;

/// Error types for catalog client operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed at the transport level
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream returned a non-success status other than 429
    #[error("upstream returned {status}: {body}")]
    UpstreamStatus {
        /// HTTP status code
        status: u16,
        /// Response body, kept as error detail
        body: String,
    },

    /// Rate limited and retries exhausted
    #[error("rate limited by upstream: retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds the upstream asked us to wait
        retry_after_secs: u64,
    },

    /// Batch request exceeds the upstream maximum
    #[error("batch of {len} ids exceeds upstream maximum of {max}")]
    BatchTooLarge {
        /// Number of ids requested
        len: usize,
        /// Upstream maximum batch size
        max: usize,
    },

    /// Base URL could not be parsed
    #[error("invalid base URL: {url}")]
    InvalidBaseUrl {
        /// The invalid URL
        url: String,
    },

    /// Access token missing or empty at construction time
    #[error("catalog access token is missing")]
    MissingCredentials,

    /// Upstream response did not have the expected shape
    #[error("invalid response from upstream: {reason}")]
    InvalidResponse {
        /// Reason the response was rejected
        reason: String,
    },
}

/// Result type for catalog client operations
pub type Result<T> = std::result::Result<T, Error>;

// Helper methods for common error construction
impl Error {
    /// Create an upstream status error
    pub fn upstream_status(status: u16, body: impl Into<String>) -> Self {
        Self::UpstreamStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a rate limited error
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    /// Create a batch too large error
    pub fn batch_too_large(len: usize, max: usize) -> Self {
        Self::BatchTooLarge { len, max }
    }

    /// Create an invalid base URL error
    pub fn invalid_base_url(url: impl Into<String>) -> Self {
        Self::InvalidBaseUrl { url: url.into() }
    }

    /// Create an invalid response error
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}
