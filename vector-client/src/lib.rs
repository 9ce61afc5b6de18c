//! Client for the vector-search provider
//!
//! Search returns ranked candidate identifiers with a small field set; full
//! records are resolved against the catalog provider by the caller. This
//! client performs a single call per query, the retry policy lives on the
//! catalog side.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Error types for vector search operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned a non-success status
    #[error("search provider returned {status}: {body}")]
    ProviderStatus {
        /// HTTP status code
        status: u16,
        /// Response body as error detail
        body: String,
    },

    /// API key missing or empty at construction time
    #[error("vector search API key is missing")]
    MissingCredentials,
}

/// Result type for vector search operations
pub type Result<T> = std::result::Result<T, Error>;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Catalog identifier of the matched record
    pub id: String,
    /// Relevance score, higher is better
    pub score: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: usize,
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<SearchHit>,
}

/// Client for a namespaced search-by-text endpoint
#[derive(Debug, Clone)]
pub struct VectorSearchClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    namespace: String,
}

impl VectorSearchClient {
    /// Create a new search client
    ///
    /// Fails when the API key is empty; absent credentials are a
    /// construction-time error.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::MissingCredentials);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            namespace: namespace.into(),
        })
    }

    /// Search the namespace for candidate records
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let url = format!("{}/query", self.base_url);
        debug!("vector search for {:?} (top_k {})", query, limit);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&QueryRequest {
                query,
                top_k: limit,
                namespace: &self.namespace,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.matches)
    }
}
