//! HTTP request handlers for the storefront endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use bookstand_cache::{Scope, SnapshotData};
use events_client::EventRecord;

use crate::server::AppState;

/// Default number of results for search requests.
const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Optional result cap for list endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    /// Maximum number of items to return
    pub limit: Option<usize>,
}

/// Query parameters for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text search query
    pub q: String,
    /// Maximum number of results
    pub limit: Option<usize>,
}

/// Request body for the batch endpoints.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Identifiers to resolve
    pub ids: Vec<String>,
}

/// Request body for cache invalidation.
#[derive(Debug, Deserialize)]
pub struct InvalidateRequest {
    /// Key family to clear
    pub scope: Scope,
    /// Specific identifier within the family, when applicable
    pub id: Option<String>,
}

/// Handle GET /health.
///
/// Reports cache statistics, store reachability and which optional
/// integrations are active. Always returns 200; an unreachable store is a
/// reported condition, not a failure.
pub async fn handle_health(State(state): State<Arc<AppState>>) -> Response {
    let cache = state.catalog().cache();
    Json(json!({
        "status": "ok",
        "uptime_seconds": state.uptime_seconds(),
        "cache": cache.stats().snapshot(),
        "store_reachable": cache.ping().await,
        "search_enabled": state.catalog().search_enabled(),
        "events_enabled": state.events().is_some(),
    }))
    .into_response()
}

/// Handle GET /categories.
pub async fn handle_categories(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let categories = state.catalog().categories().await?;
    Ok(Json(categories).into_response())
}

/// Handle GET /categories/{id}/books.
pub async fn handle_category_books(
    Path(category_id): Path<String>,
    Query(query): Query<LimitQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    tracing::debug!("Handling books request for category: {category_id}");
    let books = state
        .catalog()
        .books_by_category(&category_id, query.limit)
        .await?;
    Ok(Json(books).into_response())
}

/// Handle POST /books/batch.
pub async fn handle_books_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Response, AppError> {
    let outcome = state.catalog().books_batch(&request.ids).await?;
    Ok(Json(outcome).into_response())
}

/// Handle POST /images/batch.
pub async fn handle_images_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Response, AppError> {
    let outcome = state.catalog().images_batch(&request.ids).await?;
    Ok(Json(outcome).into_response())
}

/// Handle GET /search.
pub async fn handle_search(
    Query(query): Query<SearchQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    if query.q.trim().is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let books = state.catalog().search(&query.q, limit).await?;
    Ok(Json(books).into_response())
}

/// Handle GET /super-cache.
///
/// Serves the aggregate snapshot with an `x-cache-status` header of `HIT` or
/// `MISS`. A miss body is the static fallback shape; population is a
/// separate explicit call.
pub async fn handle_super_cache(State(state): State<Arc<AppState>>) -> Response {
    let (snapshot, status) = state.snapshots().read().await;
    (
        [("x-cache-status", status.header_value())],
        Json(snapshot),
    )
        .into_response()
}

/// Handle POST /super-cache/populate.
///
/// With a JSON body the supplied data is stored as-is; without one the
/// snapshot is rebuilt from upstream.
pub async fn handle_super_cache_populate(
    State(state): State<Arc<AppState>>,
    body: Option<Json<SnapshotData>>,
) -> Result<Response, AppError> {
    let report = match body {
        Some(Json(data)) => state.snapshots().populate_with(data).await,
        None => state.snapshots().populate_from_upstream().await?,
    };
    Ok(Json(report).into_response())
}

/// Handle GET /events.
///
/// The feed client already degrades to the static fallback on any upstream
/// trouble; a deployment without an events feed serves the fallback too.
pub async fn handle_events(State(state): State<Arc<AppState>>) -> Response {
    let events = match state.events() {
        Some(client) => client.fetch_events().await,
        None => EventRecord::fallback(),
    };
    Json(events).into_response()
}

/// Handle POST /admin/invalidate.
pub async fn handle_invalidate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<InvalidateRequest>,
) -> Response {
    let report = state
        .invalidator()
        .invalidate(request.scope, request.id.as_deref())
        .await;
    Json(report).into_response()
}

/// Application-level error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed client input (400)
    BadRequest(String),
    /// Cache or upstream failure
    Cache(bookstand_cache::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Cache(err) => (status_for(&err), err.to_string()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<bookstand_cache::Error> for AppError {
    fn from(err: bookstand_cache::Error) -> Self {
        Self::Cache(err)
    }
}

/// Map a cache-layer error to a response status.
///
/// Upstream rate limiting and an unconfigured search provider are temporary
/// or deployment conditions (503); oversized batch input is the client's
/// fault (400); everything else that crossed the upstream boundary is a bad
/// gateway.
fn status_for(err: &bookstand_cache::Error) -> StatusCode {
    use bookstand_cache::Error;
    use catalog_client::Error as CatalogError;

    match err {
        Error::Catalog(CatalogError::RateLimited { .. }) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Catalog(CatalogError::BatchTooLarge { .. }) => StatusCode::BAD_REQUEST,
        Error::SearchUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        Error::Catalog(_) | Error::Search(_) | Error::Coalesced { .. } => StatusCode::BAD_GATEWAY,
    }
}
