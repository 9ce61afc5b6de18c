//! HTTP server implementation using axum.

use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::server::AppState;

pub mod handlers;

/// Create the HTTP router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/categories", get(handlers::handle_categories))
        .route(
            "/categories/{id}/books",
            get(handlers::handle_category_books),
        )
        .route("/books/batch", post(handlers::handle_books_batch))
        .route("/images/batch", post(handlers::handle_images_batch))
        .route("/search", get(handlers::handle_search))
        .route("/super-cache", get(handlers::handle_super_cache))
        .route(
            "/super-cache/populate",
            post(handlers::handle_super_cache_populate),
        )
        .route("/events", get(handlers::handle_events))
        .route("/admin/invalidate", post(handlers::handle_invalidate))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
///
/// # Errors
///
/// Returns `ServerError` if the server fails to bind or encounters a runtime
/// error.
pub async fn start_server(bind_addr: SocketAddr, state: Arc<AppState>) -> Result<(), ServerError> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::BindFailed {
            addr: bind_addr,
            source,
        })?;

    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Shutdown(format!("HTTP server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;

    #[test]
    fn test_router_creation() {
        let config = ServerConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            catalog_url: "https://catalog.example.com".to_string(),
            catalog_token: Some("token".to_string()),
            kv_url: None,
            kv_token: None,
            vector_url: None,
            vector_api_key: None,
            vector_namespace: "books".to_string(),
            events_url: "https://sheets.googleapis.com".to_string(),
            events_api_key: None,
            events_sheet_id: None,
            events_range: "Events!A:E".to_string(),
            category_ids: String::new(),
            fallback_categories: String::new(),
        };

        let state = Arc::new(AppState::new(&config).unwrap());
        let _router = create_router(state);
    }
}
