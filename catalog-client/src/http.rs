//! Retry-wrapped HTTP client for the catalog provider

use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, trace, warn};
use url::Url;

use crate::wire::{BatchRetrieveRequest, CatalogObject, ObjectsResponse};
use crate::{Book, Category, Error, ImageRef, Result};

/// Default maximum retries
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default initial backoff in milliseconds
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;

/// Default maximum backoff in milliseconds
const DEFAULT_MAX_BACKOFF_MS: u64 = 10_000;

/// Default backoff multiplier
const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Default jitter factor (0.0 to 1.0)
const DEFAULT_JITTER_FACTOR: f64 = 0.1;

/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default request timeout
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fixed API-version header value sent with every request
const CATALOG_API_VERSION: &str = "2025-01-23";

/// Maximum number of object ids accepted by the upstream batch endpoint
pub const MAX_BATCH_OBJECTS: usize = 100;

/// HTTP client for the upstream catalog provider
///
/// Retry policy: HTTP 429 and network-level failures are retried with bounded
/// exponential backoff; any other non-success status fails immediately with
/// the response body as error detail. There is no circuit breaker, a
/// persistently failing upstream is retried on every request.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
    access_token: String,
    max_retries: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl CatalogClient {
    /// Create a new catalog client with default retry configuration
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Result<Self> {
        CatalogClientBuilder::new(base_url, access_token).build()
    }

    /// Create a builder for configuring the catalog client
    pub fn builder(base_url: &str, access_token: impl Into<String>) -> CatalogClientBuilder {
        CatalogClientBuilder::new(base_url, access_token)
    }

    /// Set the maximum number of retries for 429 and network failures
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial backoff duration in milliseconds
    pub fn with_initial_backoff_ms(mut self, initial_backoff_ms: u64) -> Self {
        self.initial_backoff_ms = initial_backoff_ms;
        self
    }

    /// Set the maximum backoff duration in milliseconds
    pub fn with_max_backoff_ms(mut self, max_backoff_ms: u64) -> Self {
        self.max_backoff_ms = max_backoff_ms;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_multiplier(mut self, backoff_multiplier: f64) -> Self {
        self.backoff_multiplier = backoff_multiplier;
        self
    }

    /// Set the jitter factor (0.0 to 1.0)
    pub fn with_jitter_factor(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor.clamp(0.0, 1.0);
        self
    }

    /// Get the configured base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Calculate backoff duration with exponential backoff and jitter
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base_backoff =
            self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped_backoff = base_backoff.min(self.max_backoff_ms as f64);

        // Add jitter
        let jitter_range = capped_backoff * self.jitter_factor;
        let jitter = rand::random::<f64>() * 2.0 * jitter_range - jitter_range;
        let final_backoff = (capped_backoff + jitter).max(0.0) as u64;

        Duration::from_millis(final_backoff)
    }

    /// Execute a request with retry logic
    ///
    /// Only 429 and network-level failures are retried; any other non-success
    /// status is surfaced immediately with the response body as detail.
    async fn execute_with_retry(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.calculate_backoff(attempt - 1);
                debug!("catalog retry attempt {} after {:?} backoff", attempt, backoff);
                sleep(backoff).await;
            }

            debug!("catalog request {} {} (attempt {})", method, url, attempt + 1);

            let mut request = self
                .client
                .request(method.clone(), url)
                .bearer_auth(&self.access_token)
                .header("Catalog-Version", CATALOG_API_VERSION);
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    trace!("catalog response status: {}", status);

                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(60);

                        warn!(
                            "catalog rate limited (attempt {}): retry after {} seconds",
                            attempt + 1,
                            retry_after
                        );
                        last_error = Some(Error::rate_limited(retry_after));
                        continue;
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        // Final attempt still rate limited
                        let retry_after = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(60);
                        return Err(Error::rate_limited(retry_after));
                    }

                    // Any other non-success fails immediately, body as detail
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::upstream_status(status.as_u16(), body));
                }
                Err(e) => {
                    let is_retryable = e.is_connect() || e.is_timeout() || e.is_request();

                    if is_retryable && attempt < self.max_retries {
                        warn!(
                            "catalog request failed (attempt {}): {}, will retry",
                            attempt + 1,
                            e
                        );
                        last_error = Some(Error::Http(e));
                    } else {
                        debug!(
                            "catalog request failed (attempt {}): {}, not retrying",
                            attempt + 1,
                            e
                        );
                        return Err(Error::Http(e));
                    }
                }
            }
        }

        // Only reached when every retry failed
        Err(last_error.unwrap_or_else(|| Error::invalid_response("all retry attempts failed")))
    }

    fn endpoint(&self, path: &str) -> Result<String> {
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            .map_err(|_| Error::invalid_base_url(format!("{}{path}", self.base_url)))
    }

    /// List all catalog categories
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let url = self.endpoint("v2/catalog/categories")?;
        let response = self.execute_with_retry(Method::GET, &url, None).await?;
        let parsed: ObjectsResponse = response.json().await?;

        Ok(parsed
            .objects
            .iter()
            .filter_map(Category::from_object)
            .collect())
    }

    /// List all items belonging to a category, transformed into books
    pub async fn list_category_items(&self, category_id: &str) -> Result<Vec<Book>> {
        let url = self.endpoint(&format!("v2/catalog/categories/{category_id}/items"))?;
        let response = self.execute_with_retry(Method::GET, &url, None).await?;
        let parsed: ObjectsResponse = response.json().await?;

        Ok(parsed.objects.iter().filter_map(Book::from_object).collect())
    }

    /// Retrieve a batch of catalog objects by id in a single upstream call
    ///
    /// Ids absent upstream are simply absent from the response, the caller is
    /// responsible for noticing them. Input length must not exceed
    /// [`MAX_BATCH_OBJECTS`].
    pub async fn batch_retrieve(&self, ids: &[String]) -> Result<Vec<CatalogObject>> {
        if ids.len() > MAX_BATCH_OBJECTS {
            return Err(Error::batch_too_large(ids.len(), MAX_BATCH_OBJECTS));
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint("v2/catalog/batch-retrieve")?;
        let body = serde_json::to_value(BatchRetrieveRequest {
            object_ids: ids.to_vec(),
        })
        .map_err(|e| Error::invalid_response(e.to_string()))?;

        let response = self
            .execute_with_retry(Method::POST, &url, Some(&body))
            .await?;
        let parsed: ObjectsResponse = response.json().await?;

        Ok(parsed.objects)
    }

    /// Resolve a single image identifier to its URL
    pub async fn retrieve_image(&self, image_id: &str) -> Result<Option<ImageRef>> {
        let objects = self.batch_retrieve(&[image_id.to_string()]).await?;
        Ok(objects.iter().find_map(ImageRef::from_object))
    }
}

/// Builder for configuring the catalog client
#[derive(Debug, Clone)]
pub struct CatalogClientBuilder {
    base_url: String,
    access_token: String,
    connect_timeout_secs: u64,
    request_timeout_secs: u64,
    max_retries: u32,
    initial_backoff_ms: u64,
    max_backoff_ms: u64,
    backoff_multiplier: f64,
    jitter_factor: f64,
}

impl CatalogClientBuilder {
    /// Create a new builder with default values
    pub fn new(base_url: &str, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.to_string(),
            access_token: access_token.into(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_factor: DEFAULT_JITTER_FACTOR,
        }
    }

    /// Set connection timeout in seconds
    pub fn connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Set request timeout in seconds
    pub fn request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    /// Set maximum retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial backoff in milliseconds
    pub fn initial_backoff_ms(mut self, ms: u64) -> Self {
        self.initial_backoff_ms = ms;
        self
    }

    /// Set maximum backoff in milliseconds
    pub fn max_backoff_ms(mut self, ms: u64) -> Self {
        self.max_backoff_ms = ms;
        self
    }

    /// Set backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set jitter factor (0.0 to 1.0)
    pub fn jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    /// Build the catalog client
    ///
    /// Fails when the access token is empty or the base URL does not parse;
    /// absent credentials are a construction-time error, not a request-time
    /// surprise.
    pub fn build(self) -> Result<CatalogClient> {
        if self.access_token.is_empty() {
            return Err(Error::MissingCredentials);
        }

        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).map_err(|_| Error::invalid_base_url(&self.base_url))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .timeout(Duration::from_secs(self.request_timeout_secs))
            .gzip(true)
            .build()?;

        Ok(CatalogClient {
            client,
            base_url,
            access_token: self.access_token,
            max_retries: self.max_retries,
            initial_backoff_ms: self.initial_backoff_ms,
            max_backoff_ms: self.max_backoff_ms,
            backoff_multiplier: self.backoff_multiplier,
            jitter_factor: self.jitter_factor,
        })
    }
}
